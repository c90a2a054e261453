use fireside_common::error::{ApiError, AuthError, DecodeError, EncodeError, TransportError};
use http::StatusCode;
use smol_str::SmolStr;

/// Errors returned by [`DocumentStore`](super::DocumentStore) operations
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StoreError {
    /// Network failure or timeout. Never retried.
    #[error("HTTP transport error: {0}")]
    Transport(
        #[from]
        #[diagnostic_source]
        TransportError,
    ),

    /// Missing or unusable credentials
    #[error("Authentication error: {0}")]
    Auth(
        #[from]
        #[diagnostic_source]
        AuthError,
    ),

    /// The service rejected the request
    #[error("{message}")]
    #[diagnostic(code(fireside::store::api))]
    Api {
        /// HTTP status of the response
        status: StatusCode,
        /// Message from the error body, or the raw body when it has none
        message: String,
        /// Canonical error code, e.g. `NOT_FOUND`
        code: Option<SmolStr>,
    },

    /// A response or wire value could not be decoded
    #[error("{0}")]
    Decode(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),

    /// Document data has no wire representation
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),

    /// Document holds more scalar values than the service accepts
    #[error("document contains too many values ({count}, limit {limit})")]
    #[diagnostic(
        code(fireside::store::size_limit),
        help("split the data across several documents")
    )]
    SizeLimitExceeded {
        /// Scalar values counted
        count: usize,
        /// Maximum allowed
        limit: usize,
    },

    /// Concurrent writers kept winning until the backoff schedule ran out
    #[error("update of {collection}/{document} timed out after {attempts} attempts")]
    #[diagnostic(
        code(fireside::store::update_timed_out),
        help("the document is under heavy write contention; retry later or widen `RetryPolicy`")
    )]
    UpdateTimedOut {
        /// Collection of the contended document
        collection: SmolStr,
        /// Contended document
        document: SmolStr,
        /// Read/commit cycles made
        attempts: u32,
    },
}

impl StoreError {
    /// Build an [`StoreError::Api`] from a non-success response.
    pub(crate) fn from_response(status: StatusCode, body: &[u8]) -> Self {
        match fireside_common::error::parse_api_error(body) {
            Some(ApiError { message, status: code, .. }) => Self::Api {
                status,
                message,
                code,
            },
            None => Self::Api {
                status,
                message: String::from_utf8_lossy(body).into_owned(),
                code: None,
            },
        }
    }

    /// The canonical error code reported by the service, if any.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_from_body() {
        let body = br#"{"error": {"code": 404, "message": "Document not found.", "status": "NOT_FOUND"}}"#;
        let err = StoreError::from_response(StatusCode::NOT_FOUND, body);
        assert_eq!(err.to_string(), "Document not found.");
        assert_eq!(err.api_code(), Some("NOT_FOUND"));
    }

    #[test]
    fn api_error_without_error_body_keeps_raw_text() {
        let err = StoreError::from_response(StatusCode::BAD_GATEWAY, b"upstream down");
        match err {
            StoreError::Api { status, message, code } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream down");
                assert!(code.is_none());
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
