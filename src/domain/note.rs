use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::store::{CollectionAccessor, ListOptions, StoreClient};
use crate::types::FilterOp;

const COLLECTION: &str = "notes";

/// One block of note content: free text or a list with a rendering hint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NoteContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<String>>,
    #[serde(
        default,
        rename = "listType",
        skip_serializing_if = "Option::is_none"
    )]
    pub list_type: Option<String>,
}

/// A note row as stored in the backend.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Vec<NoteContent>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the backend fills id and both timestamps.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewNote {
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<NoteContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// Partial update payload; only the fields that are set reach the backend.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<NoteContent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// Note queries over an owned generic accessor.
#[derive(Clone)]
pub struct NoteService {
    store: CollectionAccessor,
}

impl NoteService {
    pub fn new(client: StoreClient) -> Self {
        Self {
            store: CollectionAccessor::new(client, COLLECTION),
        }
    }

    /// Underlying accessor, for callers needing raw CRUD.
    #[must_use]
    pub fn store(&self) -> &CollectionAccessor {
        &self.store
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Note>> {
        self.store.get_all(options).await
    }

    pub async fn get(&self, id: &str) -> Result<Note> {
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, new: &NewNote) -> Result<Note> {
        self.store.create(new).await
    }

    pub async fn update(&self, id: &str, patch: &NotePatch) -> Result<Note> {
        self.store.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    /// Case-insensitive substring search on the title column.
    pub async fn search_by_title(&self, title: &str) -> Result<Vec<Note>> {
        self.store
            .filter("title", FilterOp::ILike, &format!("%{title}%"))
            .await
    }

    pub async fn favorites(&self) -> Result<Vec<Note>> {
        self.store.filter("is_favorite", FilterOp::Eq, "true").await
    }

    /// Notes whose tag array contains the given tag.
    pub async fn by_tag(&self, tag: &str) -> Result<Vec<Note>> {
        self.store
            .filter("tags", FilterOp::Contains, &format!("{{{tag}}}"))
            .await
    }

    pub async fn toggle_favorite(&self, id: &str, is_favorite: bool) -> Result<Note> {
        self.update(
            id,
            &NotePatch {
                is_favorite: Some(is_favorite),
                ..NotePatch::default()
            },
        )
        .await
    }
}
