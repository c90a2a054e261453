use serde::{Deserialize, Serialize};

/// Latitude/longitude pairs.
pub mod geo_point;
/// Paths to other documents.
pub mod reference;
/// ISO 8601 timestamps.
pub mod timestamp;
/// The native value model.
pub mod value;

/// The kind of a [`value::Value`], without its payload.
///
/// Used in conversion errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Double,
    /// UTF-8 text
    String,
    /// Raw bytes
    Bytes,
    /// Latitude/longitude pair
    GeoPoint,
    /// ISO 8601 timestamp
    Timestamp,
    /// Path of another document
    Reference,
    /// Ordered sequence
    Array,
    /// String-keyed mapping
    Map,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::GeoPoint => "geo-point",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Reference => "reference",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}
