use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::Result;
use crate::error::{Error, StoreError};

use super::rest::{body_preview, decode_api_error};

const MAX_ATTEMPTS: usize = 3;
const CORRELATION_HEADER: &str = "x-correlation-id";
const API_KEY_HEADER: &str = "apikey";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// One backend request against a named collection. The accessor layer fills
/// this in; the client owns transport, retry, and error classification.
pub(super) struct RequestSpec<'a> {
    pub(super) method: Method,
    pub(super) collection: &'a str,
    pub(super) query: Vec<(String, String)>,
    pub(super) body: Option<Value>,
    /// Ask the backend for exactly-one-row semantics.
    pub(super) single: bool,
    /// Ask mutating calls to echo the affected representation back.
    pub(super) representation: bool,
}

#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl StoreClient {
    /// Build a `StoreClient` configured with the supplied parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTPS is required but the URL uses HTTP, if the
    /// API key is not a valid header value, or if the underlying HTTP client
    /// fails to build.
    pub fn new(
        base: Url,
        api_key: SecretString,
        timeout: Duration,
        connect_timeout: Duration,
        insecure_http: bool,
    ) -> Result<Self> {
        if base.scheme() != "https" && !insecure_http {
            return Err(Error::Config(crate::error::ConfigError::InvalidField {
                field: "store.url",
                message: "only https URLs are accepted without insecure_http".to_string(),
            }));
        }

        let mut key_value = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Config(crate::error::ConfigError::InvalidField {
                field: "store.api_key",
                message: "key contains characters not allowed in headers".to_string(),
            })
        })?;
        key_value.set_sensitive(true);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret())).map_err(|_| {
                Error::Config(crate::error::ConfigError::InvalidField {
                    field: "store.api_key",
                    message: "key contains characters not allowed in headers".to_string(),
                })
            })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(concat!("medref/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(30));

        if !insecure_http {
            builder = builder.https_only(true);
        }

        let http = builder
            .build()
            .map_err(|err| StoreError::Client { source: err })?;

        Ok(Self {
            http,
            base,
            timeout,
        })
    }

    pub(super) async fn send<T>(&self, spec: RequestSpec<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let collection = spec.collection;
        let body = self.dispatch(spec).await?;
        serde_json::from_slice(&body).map_err(|err| {
            let preview = body_preview(&body);
            StoreError::Json {
                message: format!(
                    "error decoding {collection} response: {err}; body preview: {preview}"
                ),
            }
            .into()
        })
    }

    pub(super) async fn send_no_content(&self, spec: RequestSpec<'_>) -> Result<()> {
        self.dispatch(spec).await.map(|_| ())
    }

    async fn dispatch(&self, spec: RequestSpec<'_>) -> Result<Vec<u8>> {
        let url = self.collection_url(spec.collection)?;

        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_multiplier(2.0)
            .with_randomization_factor(0.25)
            .with_max_interval(Duration::from_secs(2))
            .with_max_elapsed_time(Some(self.timeout))
            .build();

        for attempt in 1..=MAX_ATTEMPTS {
            let correlation_id = Uuid::now_v7().to_string();
            let started = Instant::now();

            let mut request = self
                .http
                .request(spec.method.clone(), url.clone())
                .query(&spec.query)
                .header(CORRELATION_HEADER, &correlation_id);
            if spec.single {
                request = request.header(ACCEPT, SINGLE_OBJECT);
            }
            if spec.representation {
                request = request.header("Prefer", "return=representation");
            }
            if let Some(body) = &spec.body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let serr = StoreError::from(err);
                    match retry_delay(&mut backoff, attempt) {
                        Some(delay) => {
                            warn!(
                                collection = spec.collection,
                                %correlation_id,
                                attempt,
                                delay_ms = delay.as_millis(),
                                error = %serr,
                                "retrying after transport error"
                            );
                            sleep(delay).await;
                            continue;
                        }
                        None => return Err(exhaust(serr, attempt)),
                    }
                }
            };

            let status = response.status();
            if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
                let serr = StoreError::HttpStatus { status };
                match retry_delay(&mut backoff, attempt) {
                    Some(delay) => {
                        warn!(
                            collection = spec.collection,
                            %correlation_id,
                            attempt,
                            delay_ms = delay.as_millis(),
                            status = %status,
                            "retrying after server error"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    None => return Err(exhaust(serr, attempt)),
                }
            }

            let body = match response.bytes().await {
                Ok(body) => body.to_vec(),
                Err(err) => {
                    let serr = StoreError::from(err);
                    match retry_delay(&mut backoff, attempt) {
                        Some(delay) => {
                            warn!(
                                collection = spec.collection,
                                %correlation_id,
                                attempt,
                                delay_ms = delay.as_millis(),
                                error = %serr,
                                "retrying after body read error"
                            );
                            sleep(delay).await;
                            continue;
                        }
                        None => return Err(exhaust(serr, attempt)),
                    }
                }
            };

            if !status.is_success() {
                return Err(decode_api_error(status, &body).into());
            }

            debug!(
                collection = spec.collection,
                method = %spec.method,
                %correlation_id,
                attempt,
                latency_ms = started.elapsed().as_millis(),
                "store call succeeded"
            );
            return Ok(body);
        }
        unreachable!("retry loop should have returned before reaching this point")
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidField {
                field: "store.url",
                message: "base URL cannot serve as a collection root".to_string(),
            })?
            .pop_if_empty()
            .push(collection);
        Ok(url)
    }
}

/// Next backoff delay, or `None` once the attempt budget is spent.
fn retry_delay(
    backoff: &mut backoff::ExponentialBackoff,
    attempt: usize,
) -> Option<Duration> {
    if attempt >= MAX_ATTEMPTS {
        return None;
    }
    backoff.next_backoff()
}

fn exhaust(source: StoreError, attempt: usize) -> Error {
    if attempt >= MAX_ATTEMPTS {
        StoreError::RetryExhausted {
            source: Box::new(source),
        }
        .into()
    } else {
        source.into()
    }
}
