//! Request and response bodies of the document REST API.

use std::collections::BTreeMap;

use fireside_common::codec::WireValue;
use fireside_common::error::DecodeError;
use fireside_common::{DocumentReference, Map, Timestamp, decode_fields};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A document as returned by the service, with its fields decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Fully qualified document path
    pub name: SmolStr,
    /// Decoded document contents
    pub fields: Map,
    /// When the document was first written, if reported
    pub create_time: Option<Timestamp>,
    /// Version token of this snapshot. Conditional writes are made against it.
    pub update_time: Timestamp,
}

impl Document {
    /// A reference to this document, suitable for storing in another one.
    pub fn reference(&self) -> DocumentReference {
        DocumentReference::new(self.name.clone())
    }

    /// The last path segment of [`name`](Self::name).
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub(crate) fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
        let raw: DocumentBody = serde_json::from_slice(body)?;
        let update_time = raw
            .update_time
            .ok_or(DecodeError::MissingField("updateTime"))?;
        Ok(Self {
            name: raw.name,
            // absent when the document has no fields
            fields: decode_fields(&raw.fields)?,
            create_time: raw.create_time,
            update_time,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody {
    #[serde(default)]
    name: SmolStr,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    create_time: Option<Timestamp>,
    #[serde(default)]
    update_time: Option<Timestamp>,
}

/// Body of a create request.
#[derive(Serialize)]
pub(crate) struct CreateRequest {
    pub fields: BTreeMap<SmolStr, WireValue>,
}

/// Body of a single-write commit guarded by the version it was based on.
#[derive(Serialize)]
pub(crate) struct CommitRequest<'a> {
    writes: [Write<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Write<'a> {
    update: DocumentWrite<'a>,
    current_document: Precondition<'a>,
}

#[derive(Serialize)]
struct DocumentWrite<'a> {
    name: &'a str,
    fields: BTreeMap<SmolStr, WireValue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Precondition<'a> {
    update_time: &'a Timestamp,
}

impl<'a> CommitRequest<'a> {
    pub(crate) fn new(
        name: &'a str,
        fields: BTreeMap<SmolStr, WireValue>,
        base_version: &'a Timestamp,
    ) -> Self {
        Self {
            writes: [Write {
                update: DocumentWrite { name, fields },
                current_document: Precondition {
                    update_time: base_version,
                },
            }],
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
    #[serde(default)]
    commit_time: Option<Timestamp>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    update_time: Option<Timestamp>,
}

/// The new version token from a successful commit response.
pub(crate) fn committed_version(body: &[u8]) -> Result<Timestamp, DecodeError> {
    let response: CommitResponse = serde_json::from_slice(body)?;
    response
        .write_results
        .into_iter()
        .next()
        .and_then(|result| result.update_time)
        .or(response.commit_time)
        .ok_or(DecodeError::MissingField("writeResults"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireside_common::Value;
    use serde_json::json;

    #[test]
    fn parses_document() {
        let body = serde_json::to_vec(&json!({
            "name": "projects/p/databases/(default)/documents/users/alice",
            "fields": {"age": {"integerValue": "31"}},
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-02T00:00:00.123456Z"
        }))
        .unwrap();
        let doc = Document::from_body(&body).unwrap();
        assert_eq!(doc.id(), "alice");
        assert_eq!(doc.fields.get("age"), Some(&Value::Integer(31)));
        assert_eq!(doc.update_time.as_str(), "2024-01-02T00:00:00.123456Z");
        assert_eq!(doc.reference().as_str(), doc.name);
    }

    #[test]
    fn document_without_fields_is_empty() {
        let doc =
            Document::from_body(br#"{"name": "x/y", "updateTime": "2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(doc.fields.is_empty());
        assert!(doc.create_time.is_none());
    }

    #[test]
    fn document_without_version_fails() {
        assert!(matches!(
            Document::from_body(br#"{"name": "x/y", "fields": {}}"#),
            Err(DecodeError::MissingField("updateTime"))
        ));
    }

    #[test]
    fn commit_body_shape() {
        let version = Timestamp::new("2024-01-01T00:00:00Z");
        let fields = fireside_common::encode_fields(
            &[(SmolStr::new_static("n"), Value::Integer(1))].into(),
        )
        .unwrap();
        let request = CommitRequest::new("projects/p/databases/d/documents/c/x", fields, &version);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"writes": [{
                "update": {
                    "name": "projects/p/databases/d/documents/c/x",
                    "fields": {"n": {"integerValue": "1"}}
                },
                "currentDocument": {"updateTime": "2024-01-01T00:00:00Z"}
            }]})
        );
    }

    #[test]
    fn commit_version_prefers_write_result() {
        let body = br#"{"writeResults": [{"updateTime": "A"}], "commitTime": "B"}"#;
        assert_eq!(committed_version(body).unwrap().as_str(), "A");
        let body = br#"{"writeResults": [{}], "commitTime": "B"}"#;
        assert_eq!(committed_version(body).unwrap().as_str(), "B");
        assert!(committed_version(b"{}").is_err());
    }
}
