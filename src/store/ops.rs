use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::error::StoreError;
use crate::types::FilterOp;

use super::StoreClient;
use super::client::RequestSpec;

/// Listing knobs for [`CollectionAccessor::get_all`].
#[derive(Clone, Debug)]
pub struct ListOptions {
    pub order_by: Option<String>,
    pub ascending: bool,
    pub limit: Option<u32>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            order_by: None,
            ascending: true,
            limit: None,
        }
    }
}

impl ListOptions {
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    #[must_use]
    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Generic CRUD + filter surface over one named backend collection.
///
/// Row typing is left to the call site via serde, so one accessor type
/// serves every collection; domain services own an instance and add their
/// typed helpers on top.
#[derive(Clone)]
pub struct CollectionAccessor {
    client: StoreClient,
    collection: String,
}

impl CollectionAccessor {
    pub fn new(client: StoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetch every row, optionally ordered and limited.
    pub async fn get_all<T>(&self, options: &ListOptions) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut query = vec![("select".to_string(), "*".to_string())];
        if let Some(column) = &options.order_by {
            let direction = if options.ascending { "asc" } else { "desc" };
            query.push(("order".to_string(), format!("{column}.{direction}")));
        }
        if let Some(limit) = options.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        self.client
            .send(RequestSpec {
                method: Method::GET,
                collection: &self.collection,
                query,
                body: None,
                single: false,
                representation: false,
            })
            .await
    }

    /// Fetch the single row with the given id.
    pub async fn get_by_id<T>(&self, id: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.client
            .send(RequestSpec {
                method: Method::GET,
                collection: &self.collection,
                query: vec![
                    ("select".to_string(), "*".to_string()),
                    ("id".to_string(), format!("eq.{id}")),
                ],
                body: None,
                single: true,
                representation: false,
            })
            .await
    }

    /// Insert a row and return the created representation.
    pub async fn create<T, R>(&self, row: &R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Serialize,
    {
        let body = encode_body(row)?;
        self.client
            .send(RequestSpec {
                method: Method::POST,
                collection: &self.collection,
                query: Vec::new(),
                body: Some(body),
                single: true,
                representation: true,
            })
            .await
    }

    /// Patch the row with the given id and return the updated representation.
    pub async fn update<T, R>(&self, id: &str, patch: &R) -> Result<T>
    where
        T: DeserializeOwned,
        R: Serialize,
    {
        let body = encode_body(patch)?;
        self.client
            .send(RequestSpec {
                method: Method::PATCH,
                collection: &self.collection,
                query: vec![("id".to_string(), format!("eq.{id}"))],
                body: Some(body),
                single: true,
                representation: true,
            })
            .await
    }

    /// Delete the row with the given id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .send_no_content(RequestSpec {
                method: Method::DELETE,
                collection: &self.collection,
                query: vec![("id".to_string(), format!("eq.{id}"))],
                body: None,
                single: false,
                representation: false,
            })
            .await
    }

    /// Fetch rows where `column` matches `value` under the given operator.
    pub async fn filter<T>(&self, column: &str, op: FilterOp, value: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.client
            .send(RequestSpec {
                method: Method::GET,
                collection: &self.collection,
                query: vec![
                    ("select".to_string(), "*".to_string()),
                    (column.to_string(), format!("{}.{value}", op.as_query_op())),
                ],
                body: None,
                single: false,
                representation: false,
            })
            .await
    }
}

fn encode_body<R: Serialize>(row: &R) -> Result<serde_json::Value> {
    serde_json::to_value(row)
        .map_err(|err| {
            StoreError::Json {
                message: format!("error encoding request body: {err}"),
            }
            .into()
        })
}
