//! Client-side error taxonomy.
//!
//! Every failure a caller can see maps to one of these classes so the UI
//! layer can pick messaging without string-matching: expired credentials,
//! transport failures, server faults, field-level validation, stale ids,
//! duplicate attachments, exceeded deadlines, and user cancellation.

use pacta_core::FieldError;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Field-level errors carried by this error, for re-attaching to the
    /// originating form inputs.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Server { .. } | ClientError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// The API's error body shape (`ErrorResponse` on the server side).
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub field_errors: Option<Vec<FieldError>>,
}

/// Map an HTTP status plus parsed error body onto the taxonomy.
pub fn classify_response(status: u16, body: Option<ErrorBody>) -> ClientError {
    let message = body
        .as_ref()
        .map(|b| b.error.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed with status {}", status));

    match status {
        401 | 403 => ClientError::Auth(message),
        404 => ClientError::NotFound(message),
        408 => ClientError::Timeout(message),
        409 => ClientError::Conflict(message),
        400 | 413 | 422 => ClientError::Validation {
            message,
            field_errors: body.and_then(|b| b.field_errors).unwrap_or_default(),
        },
        status => ClientError::Server { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth() {
        let err = classify_response(401, None);
        assert!(matches!(err, ClientError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_conflict() {
        let body = ErrorBody {
            error: "Document is already attached to this contract".to_string(),
            code: "CONFLICT".to_string(),
            field_errors: None,
        };
        match classify_response(409, Some(body)) {
            ClientError::Conflict(msg) => assert!(msg.contains("already attached")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_validation_keeps_field_errors() {
        let body = ErrorBody {
            error: "Validation failed".to_string(),
            code: "VALIDATION_ERROR".to_string(),
            field_errors: Some(vec![FieldError::new(
                "counterparty_name",
                "Counterparty name is required",
            )]),
        };
        let err = classify_response(400, Some(body));
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "counterparty_name");
    }

    #[test]
    fn test_classify_server_is_retryable() {
        let err = classify_response(503, None);
        assert!(matches!(err, ClientError::Server { status: 503, .. }));
        assert!(err.is_retryable());
    }
}
