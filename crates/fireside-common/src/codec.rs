//! Translation between [`Value`] and the service's typed value envelope.
//!
//! On the wire every value is an object with exactly one tag naming its type:
//!
//! ```json
//! {"integerValue": "42"}
//! {"mapValue": {"fields": {"name": {"stringValue": "alice"}}}}
//! {"arrayValue": {"values": [{"booleanValue": true}]}}
//! ```
//!
//! Encoding goes through the typed [`WireValue`] enum. Decoding works on raw
//! JSON instead, because it has to cope with tags it does not know and with
//! user fields whose names collide with tag names.
//!
//! # Known limitation
//!
//! A node is recognised as `mapValue`, `arrayValue` or `geoPointValue` by
//! checking that its payload has exactly the expected field names (or none,
//! since the service leaves out empty and zero members). A user map
//! with a single key literally called `"mapValue"` whose value is an object
//! with a single `"fields"` key is therefore indistinguishable from a map
//! node, and decodes as one.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{
    geo_point::GeoPoint,
    reference::DocumentReference,
    timestamp::Timestamp,
    value::{Map, Value},
};


/// Location of a value inside a document, used in error messages.
///
/// Displays as `profile.tags[2]`; the empty path displays as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Map key
    Key(SmolStr),
    /// Array index
    Index(usize),
}

impl FieldPath {
    /// Descend into a map key.
    pub fn push_key(&mut self, key: &str) {
        self.0.push(PathSegment::Key(key.into()));
    }

    /// Descend into an array element.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Step back out of the last segment.
    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Errors raised while turning native values into wire nodes.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// An array directly inside another array
    #[error("nested arrays are not supported (at `{path}`)")]
    #[diagnostic(
        code(fireside::encode::nested_array),
        help("wrap the inner array in a map, e.g. `{{\"items\": [...]}}`")
    )]
    UnsupportedShape {
        /// Where the inner array sits
        path: FieldPath,
    },

    /// A value with no wire representation
    #[error("value at `{path}` is not supported: {found}")]
    #[diagnostic(code(fireside::encode::unsupported_type))]
    UnsupportedType {
        /// Where the value sits
        path: FieldPath,
        /// What was found
        found: String,
    },

    /// Serializing a host type to JSON failed
    #[error("failed to serialize value: {0}")]
    #[diagnostic(code(fireside::encode::json))]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading wire nodes or response bodies.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),

    /// A known tag carried a payload it cannot hold
    #[error("malformed `{tag}` at `{path}`: {message}")]
    #[diagnostic(code(fireside::decode::malformed))]
    Malformed {
        /// Where the node sits
        path: FieldPath,
        /// The tag of the node
        tag: SmolStr,
        /// What was wrong
        message: String,
    },

    /// A response lacked a field the operation needs
    #[error("response is missing `{0}`")]
    #[diagnostic(code(fireside::decode::missing_field))]
    MissingField(&'static str),
}

/// A typed wire value node. Exactly one tag is present per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    /// `{"nullValue": null}`
    NullValue(()),
    /// `{"booleanValue": true}`
    BooleanValue(bool),
    /// `{"integerValue": "42"}`, decimal text
    IntegerValue(SmolStr),
    /// `{"doubleValue": 1.5}`; non-finite values travel as strings
    DoubleValue(#[serde(with = "double")] f64),
    /// `{"timestampValue": "2000-01-01T00:00:00Z"}`
    TimestampValue(SmolStr),
    /// `{"stringValue": "..."}`
    StringValue(SmolStr),
    /// `{"bytesValue": "..."}`
    BytesValue(SmolStr),
    /// `{"referenceValue": "projects/..."}`
    ReferenceValue(SmolStr),
    /// `{"geoPointValue": {"latitude": 0, "longitude": 0}}`
    GeoPointValue(GeoPoint),
    /// `{"arrayValue": {"values": [...]}}`
    ArrayValue(ArrayValue),
    /// `{"mapValue": {"fields": {...}}}`
    MapValue(MapValue),
}

/// Payload of an `arrayValue` node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Elements, in order
    #[serde(default)]
    pub values: Vec<WireValue>,
}

/// Payload of a `mapValue` node, and the `fields` of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Entries
    #[serde(default)]
    pub fields: BTreeMap<SmolStr, WireValue>,
}

/// Doubles as JSON numbers, with the protobuf JSON spellings for non-finite values.
mod double {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        super::json_to_double(&raw).ok_or_else(|| D::Error::custom("expected a double"))
    }
}

/// Bytes travel as text. Invalid UTF-8 sequences are dropped.
pub(crate) fn bytes_to_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

fn json_to_double(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

/// Encode a document's top-level entries into the wire `fields` object.
///
/// The result is not wrapped in a map node; callers put it under `"fields"`.
pub fn encode_fields(fields: &Map) -> Result<BTreeMap<SmolStr, WireValue>, EncodeError> {
    let mut path = FieldPath::default();
    encode_map(fields, &mut path)
}

/// Encode a single value. `inside_array` marks values that are array elements.
pub fn encode_value(value: &Value, inside_array: bool) -> Result<WireValue, EncodeError> {
    let mut path = FieldPath::default();
    encode_node(value, inside_array, &mut path)
}

fn encode_map(
    map: &Map,
    path: &mut FieldPath,
) -> Result<BTreeMap<SmolStr, WireValue>, EncodeError> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        path.push_key(key);
        let node = encode_node(value, false, path);
        path.pop();
        out.insert(key.clone(), node?);
    }
    Ok(out)
}

fn encode_node(
    value: &Value,
    inside_array: bool,
    path: &mut FieldPath,
) -> Result<WireValue, EncodeError> {
    Ok(match value {
        Value::Null => WireValue::NullValue(()),
        Value::Boolean(b) => WireValue::BooleanValue(*b),
        Value::Integer(i) => WireValue::IntegerValue(smol_str::format_smolstr!("{i}")),
        Value::Double(d) => WireValue::DoubleValue(*d),
        Value::String(s) => WireValue::StringValue(s.clone()),
        Value::Bytes(b) => WireValue::BytesValue(bytes_to_text(b).into()),
        Value::GeoPoint(p) => WireValue::GeoPointValue(*p),
        Value::Timestamp(t) => WireValue::TimestampValue(t.as_str().into()),
        Value::Reference(r) => WireValue::ReferenceValue(r.as_str().into()),
        Value::Array(items) => {
            if inside_array {
                return Err(EncodeError::UnsupportedShape { path: path.clone() });
            }
            let mut values = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                let node = encode_node(item, true, path);
                path.pop();
                values.push(node?);
            }
            WireValue::ArrayValue(ArrayValue { values })
        }
        Value::Map(map) => WireValue::MapValue(MapValue {
            fields: encode_map(map, path)?,
        }),
    })
}

/// Decode a wire `fields` object into a document map.
pub fn decode_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Result<Map, DecodeError> {
    let mut path = FieldPath::default();
    decode_map(fields, &mut path)
}

/// Decode one wire node (or any raw JSON) into a value.
///
/// Objects whose single key is a known tag with a matching payload decode as
/// that type. Everything else decodes structurally: objects become maps,
/// arrays become arrays, JSON scalars become the matching scalar. That keeps
/// unknown tags intact instead of failing.
pub fn decode_value(node: &serde_json::Value) -> Result<Value, DecodeError> {
    let mut path = FieldPath::default();
    decode_node(node, &mut path)
}

fn decode_map(
    map: &serde_json::Map<String, serde_json::Value>,
    path: &mut FieldPath,
) -> Result<Map, DecodeError> {
    let mut out = Map::new();
    for (key, node) in map {
        path.push_key(key);
        let value = decode_node(node, path);
        path.pop();
        out.insert(key.into(), value?);
    }
    Ok(out)
}

fn decode_node(node: &serde_json::Value, path: &mut FieldPath) -> Result<Value, DecodeError> {
    use serde_json::Value as Json;
    match node {
        Json::Object(map) => {
            if let (1, Some((tag, payload))) = (map.len(), map.iter().next()) {
                if let Some(value) = decode_tagged(tag, payload, path)? {
                    return Ok(value);
                }
            }
            decode_map(map, path).map(Value::Map)
        }
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                let value = decode_node(item, path);
                path.pop();
                out.push(value?);
            }
            Ok(Value::Array(out))
        }
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => Ok(n
            .as_i64()
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Double(n.as_f64().unwrap_or(f64::NAN)))),
        Json::String(s) => Ok(Value::String(s.into())),
    }
}

/// Decode `{tag: payload}`. `Ok(None)` means the pair is not a wire node and
/// should be read as a plain map entry.
fn decode_tagged(
    tag: &str,
    payload: &serde_json::Value,
    path: &mut FieldPath,
) -> Result<Option<Value>, DecodeError> {
    use serde_json::Value as Json;

    let malformed = |path: &FieldPath, message: &str| DecodeError::Malformed {
        path: path.clone(),
        tag: tag.into(),
        message: message.to_owned(),
    };
    let scalar = !matches!(payload, Json::Object(_) | Json::Array(_));

    let value = match tag {
        "nullValue" if scalar => Value::Null,
        "booleanValue" if scalar => Value::Boolean(
            payload
                .as_bool()
                .ok_or_else(|| malformed(path, "expected a boolean"))?,
        ),
        "integerValue" if scalar => {
            let parsed = match payload {
                Json::String(s) => s.parse::<i64>().ok(),
                Json::Number(n) => n.as_i64(),
                _ => None,
            };
            Value::Integer(parsed.ok_or_else(|| malformed(path, "expected a 64-bit integer"))?)
        }
        "doubleValue" if scalar => Value::Double(
            json_to_double(payload).ok_or_else(|| malformed(path, "expected a double"))?,
        ),
        "stringValue" if scalar => Value::String(
            text(payload).ok_or_else(|| malformed(path, "expected a string"))?,
        ),
        "bytesValue" if scalar => {
            let text = text(payload).ok_or_else(|| malformed(path, "expected text"))?;
            Value::Bytes(bytes::Bytes::copy_from_slice(text.as_bytes()))
        }
        "timestampValue" if scalar => Value::Timestamp(Timestamp::new(
            text(payload).ok_or_else(|| malformed(path, "expected a timestamp string"))?,
        )),
        "referenceValue" if scalar => Value::Reference(DocumentReference::new(
            text(payload).ok_or_else(|| malformed(path, "expected a document path"))?,
        )),
        "mapValue" => match payload {
            Json::Object(inner) if inner.is_empty() => Value::Map(Map::new()),
            Json::Object(inner) if inner.len() == 1 => match inner.get("fields") {
                Some(Json::Object(fields)) => Value::Map(decode_map(fields, path)?),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        },
        "arrayValue" => match payload {
            Json::Object(inner) if inner.is_empty() => Value::Array(Vec::new()),
            Json::Object(inner) if inner.len() == 1 => match inner.get("values") {
                Some(Json::Array(items)) => {
                    let mut out = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        path.push_index(index);
                        let value = decode_node(item, path);
                        path.pop();
                        out.push(value?);
                    }
                    Value::Array(out)
                }
                _ => return Ok(None),
            },
            _ => return Ok(None),
        },
        "geoPointValue" => match payload {
            Json::Object(inner) if is_lat_lng(inner) => {
                let coordinate = |key: &str| inner.get(key).and_then(Json::as_f64).unwrap_or(0.0);
                Value::GeoPoint(GeoPoint::new(coordinate("latitude"), coordinate("longitude")))
            }
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn text(payload: &serde_json::Value) -> Option<SmolStr> {
    payload.as_str().map(SmolStr::from)
}

/// Only `latitude`/`longitude` keys, each a number. The service omits zeroes,
/// so either key (or both) may be missing.
fn is_lat_lng(inner: &serde_json::Map<String, serde_json::Value>) -> bool {
    inner
        .iter()
        .all(|(k, v)| matches!(k.as_str(), "latitude" | "longitude") && v.is_number())
}
