//! Error types shared by the store client and its collaborators

use serde::Deserialize;
use smol_str::SmolStr;

pub use crate::codec::{DecodeError, EncodeError, FieldPath};
pub use crate::types::value::ConversionError;

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out
    #[error("Request timeout")]
    #[diagnostic(help("the per-request timeout is configured with `StoreOptions::timeout`"))]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

impl From<http::Error> for TransportError {
    fn from(e: http::Error) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

/// Authentication and authorization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AuthError {
    /// Request requires authentication but none was provided
    #[error("Database not enabled: no ID token available")]
    #[diagnostic(
        code(fireside::auth::not_authenticated),
        help("enable the store with credentials from a sign-in before issuing requests")
    )]
    NotAuthenticated,

    /// The token could not be turned into an `Authorization` header
    #[error("Invalid ID token")]
    #[diagnostic(code(fireside::auth::invalid_token))]
    InvalidToken,
}

/// Error body returned by the document service.
///
/// ```json
/// {"error": {"code": 404, "message": "Document ... not found.", "status": "NOT_FOUND"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
pub struct ApiError {
    /// Numeric code, mirrors the HTTP status
    #[serde(default)]
    pub code: u16,
    /// Human readable message
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `FAILED_PRECONDITION`
    #[serde(default)]
    pub status: Option<SmolStr>,
}

impl ApiError {
    /// Status string the service reports when a commit precondition no longer holds.
    pub const FAILED_PRECONDITION: &'static str = "FAILED_PRECONDITION";

    /// Whether this error reports a failed write precondition.
    pub fn is_failed_precondition(&self) -> bool {
        self.status.as_deref() == Some(Self::FAILED_PRECONDITION)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Parse `{"error": {...}}` out of a response body, if present.
pub fn parse_api_error(body: &[u8]) -> Option<ApiError> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precondition_error() {
        let body = serde_json::to_vec(&serde_json::json!({
            "error": {
                "code": 400,
                "message": "the stored version does not match the required base version",
                "status": "FAILED_PRECONDITION"
            }
        }))
        .unwrap();
        let err = parse_api_error(&body).expect("error body");
        assert!(err.is_failed_precondition());
        assert_eq!(err.code, 400);
    }

    #[test]
    fn missing_error_key_is_none() {
        assert!(parse_api_error(br#"{"fields": {}}"#).is_none());
        assert!(parse_api_error(b"not json").is_none());
    }

    #[test]
    fn partial_error_body_uses_defaults() {
        let err = parse_api_error(br#"{"error": {"message": "nope"}}"#).unwrap();
        assert_eq!(err.message, "nope");
        assert_eq!(err.code, 0);
        assert!(!err.is_failed_precondition());
    }
}
