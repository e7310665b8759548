use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: reqwest::StatusCode },
    #[error("invalid JSON payload: {message}")]
    Json { message: String },
    #[error("invalid field {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("backend error {code}: {message}")]
    Api { code: String, message: String },
    #[error("retry budget exhausted")]
    RetryExhausted {
        #[source]
        source: Box<StoreError>,
    },
}

impl From<reqwest::Error> for StoreError {
    fn from(source: reqwest::Error) -> Self {
        if source.is_status() {
            if let Some(status) = source.status() {
                return Self::HttpStatus { status };
            }
        }
        Self::Request { source }
    }
}

impl Error {
    /// Transient transport failures a caller may reasonably try again.
    ///
    /// Decode and backend errors are terminal: the store client has already
    /// spent its retry budget before surfacing them, and a malformed body
    /// will not get better on a replay.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Request { .. }) | Self::Store(StoreError::HttpStatus { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, StoreError};
    use reqwest::StatusCode;

    #[test]
    fn transport_failures_are_retriable() {
        let err = Error::Store(StoreError::HttpStatus {
            status: StatusCode::BAD_GATEWAY,
        });
        assert!(err.is_retriable());
    }

    #[test]
    fn decode_and_backend_failures_are_terminal() {
        let json = Error::Store(StoreError::Json {
            message: "truncated body".to_string(),
        });
        assert!(!json.is_retriable());

        let api = Error::Store(StoreError::Api {
            code: "23505".to_string(),
            message: "duplicate key".to_string(),
        });
        assert!(!api.is_retriable());

        let exhausted = Error::Store(StoreError::RetryExhausted {
            source: Box::new(StoreError::HttpStatus {
                status: StatusCode::SERVICE_UNAVAILABLE,
            }),
        });
        assert!(!exhausted.is_retriable());
    }
}
