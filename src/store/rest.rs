use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::StoreError;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Error body shape the REST backend produces alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) message: Option<String>,
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) details: Option<String>,
    #[serde(default)]
    pub(super) hint: Option<String>,
}

/// Turn a failed response into the most specific error the body allows.
pub(super) fn decode_api_error(status: StatusCode, body: &[u8]) -> StoreError {
    if let Ok(parsed) = serde_json::from_slice::<ApiErrorBody>(body) {
        if parsed.message.is_some() || parsed.code.is_some() {
            let mut message = parsed.message.unwrap_or_default();
            if let Some(details) = parsed.details {
                if !details.is_empty() {
                    message.push_str(" – ");
                    message.push_str(&details);
                }
            }
            if let Some(hint) = parsed.hint {
                if !hint.is_empty() {
                    message.push_str(" (hint: ");
                    message.push_str(&hint);
                    message.push(')');
                }
            }
            return StoreError::Api {
                code: parsed.code.unwrap_or_else(|| status.as_u16().to_string()),
                message,
            };
        }
    }
    StoreError::HttpStatus { status }
}

pub(super) fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&body[..end]).to_string();
    if body.len() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::{body_preview, decode_api_error};
    use crate::error::StoreError;
    use reqwest::StatusCode;

    #[test]
    fn decode_api_error_prefers_backend_body() {
        let body = br#"{"message":"duplicate key","code":"23505","details":"already exists","hint":null}"#;
        match decode_api_error(StatusCode::CONFLICT, body) {
            StoreError::Api { code, message } => {
                assert_eq!(code, "23505");
                assert!(message.contains("duplicate key"));
                assert!(message.contains("already exists"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn decode_api_error_falls_back_to_status() {
        match decode_api_error(StatusCode::NOT_FOUND, b"<html>not json</html>") {
            StoreError::HttpStatus { status } => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[test]
    fn body_preview_truncates_and_escapes() {
        assert_eq!(body_preview(b""), "<empty>");
        assert_eq!(body_preview(b"a\nb"), "a\\nb");
        let long = vec![b'x'; 300];
        let preview = body_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), 256 + 3);
    }
}
