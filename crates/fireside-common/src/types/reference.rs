use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use std::fmt;

/// Reference to another document, by its fully qualified path:
///
/// `projects/{project}/databases/{database}/documents/{collection}/{document}`
///
/// The path is opaque to this crate; it is neither parsed nor validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentReference(SmolStr);

impl DocumentReference {
    /// Wrap an already qualified document path.
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self(path.into())
    }

    /// Build the path from its components.
    pub fn from_parts(project: &str, database: &str, collection: &str, document: &str) -> Self {
        Self(format_smolstr!(
            "projects/{project}/databases/{database}/documents/{collection}/{document}"
        ))
    }

    /// The full path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
