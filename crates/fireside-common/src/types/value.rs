use bytes::Bytes;
use smol_str::SmolStr;
use std::collections::BTreeMap;

use crate::types::{
    ValueKind, geo_point::GeoPoint, reference::DocumentReference, timestamp::Timestamp,
};

mod convert;

pub use convert::{ConversionError, from_value, to_value};

/// String-keyed mapping of values, the shape of a whole document.
pub type Map = BTreeMap<SmolStr, Value>;

/// A native document value.
///
/// Every variant has a wire representation, with one structural restriction:
/// an [`Value::Array`] may not directly contain another array. The encoder
/// rejects such values rather than flattening them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit `null`
    #[default]
    Null,
    /// Boolean
    Boolean(bool),
    /// Signed 64-bit integer
    Integer(i64),
    /// 64-bit float, including the non-finite values
    Double(f64),
    /// UTF-8 text
    String(SmolStr),
    /// Raw bytes
    Bytes(Bytes),
    /// Latitude/longitude pair
    GeoPoint(GeoPoint),
    /// ISO 8601 timestamp
    Timestamp(Timestamp),
    /// Reference to another document
    Reference(DocumentReference),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Nested mapping
    Map(Map),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::GeoPoint(_) => ValueKind::GeoPoint,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Reference(_) => ValueKind::Reference,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as bytes.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow as an array.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutably borrow as an array.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as a map.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Mutably borrow as a map.
    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key when this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Number of scalar leaves below (and including) this value.
    ///
    /// Empty maps and arrays contribute nothing.
    pub fn leaf_count(&self) -> usize {
        match self {
            Value::Array(items) => items.iter().map(Value::leaf_count).sum(),
            Value::Map(map) => map.values().map(Value::leaf_count).sum(),
            _ => 1,
        }
    }
}
