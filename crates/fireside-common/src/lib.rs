//! Common types for the fireside document store client.
//!
//! This crate holds everything that does not need a network connection: the
//! native [`Value`] model, the wire codec that maps it to and from the typed
//! JSON envelope the document service speaks, the merge engine used for
//! partial updates, and the [`HttpClient`](http_client::HttpClient)
//! abstraction the store is generic over.

#![warn(missing_docs)]
pub use smol_str;

/// Wire codec between [`Value`] and the service's typed value nodes.
pub mod codec;
pub mod error;
/// HTTP client abstraction used by fireside crates.
pub mod http_client;
/// Replace/delete overlays applied to in-memory documents.
pub mod merge;
/// Native value model and the domain value types.
pub mod types;

pub use codec::{decode_fields, decode_value, encode_fields, encode_value};
pub use merge::{Delete, DeleteTree, MAX_LEAF_VALUES, Replace, ReplaceTree, count_leaves};
pub use types::{
    geo_point::GeoPoint,
    reference::DocumentReference,
    timestamp::Timestamp,
    value::{Map, Value},
};

/// Authorization token attached to document store requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationToken {
    /// Bearer token (the ID token issued by the identity service)
    Bearer(smol_str::SmolStr),
}

impl TryFrom<&AuthorizationToken> for http::HeaderValue {
    type Error = http::header::InvalidHeaderValue;

    fn try_from(token: &AuthorizationToken) -> Result<Self, Self::Error> {
        match token {
            AuthorizationToken::Bearer(t) => http::HeaderValue::from_str(&format!("Bearer {t}")),
        }
    }
}
