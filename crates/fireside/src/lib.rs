//! # fireside
//!
//! Client for a schema-less document database reached over its REST API.
//!
//! Documents are native [`Map`]s of [`Value`]s; the codec in
//! [`fireside_common`] turns them into the typed wire envelope and back. On
//! top of that, [`DocumentStore`] offers create, read and delete plus an
//! optimistic partial [`update`](DocumentStore::update): the document is
//! read, the caller's overlays are merged into it locally, and the result is
//! committed only if nobody else wrote in between. Conflicts are retried with
//! backoff.
//!
//! ```no_run
//! # async fn demo() -> Result<(), fireside::StoreError> {
//! use fireside::{Credentials, Delete, DocumentStore, Replace, Value};
//!
//! // normally deserialized from the identity service's sign-in response
//! let credentials = Credentials::new("uid123", "ID_TOKEN");
//! let store = DocumentStore::with_reqwest(credentials, "my-project");
//!
//! let profile: fireside::Map = [("name".into(), Value::from("Alice"))].into();
//! store.create("profiles", "", &profile).await?;
//!
//! let replace = Replace::tree([("age".into(), Value::Integer(31))].into());
//! let delete = Delete::keys(["nickname"]);
//! let updated = store.update("profiles", "", &replace, &delete).await?;
//! println!("now at version {}", updated.update_time);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `tracing`: spans and events for requests, backoff and conflicts.

#![warn(missing_docs)]

pub mod credentials;
pub mod store;

pub use fireside_common as common;
pub use fireside_common::{
    Delete, DeleteTree, DocumentReference, GeoPoint, MAX_LEAF_VALUES, Map, Replace, ReplaceTree,
    Timestamp, Value,
};

pub use credentials::{Authenticator, Credentials};
pub use store::{Document, DocumentStore, RetryPolicy, StoreError, StoreOptions};
