use crate::codec::{EncodeError, FieldPath};
use crate::types::{
    ValueKind, geo_point::GeoPoint, reference::DocumentReference, timestamp::Timestamp,
    value::{Map, Value},
};
use bytes::Bytes;
use core::any::TypeId;
use serde::{Serialize, de::DeserializeOwned};
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashMap};

/// Error used for converting out of a [`Value`].
#[derive(Clone, Debug, thiserror::Error, miette::Diagnostic)]
#[non_exhaustive]
pub enum ConversionError {
    /// The value was not of the kind we expected.
    #[error("kind error: expected {expected} but found {found}")]
    WrongKind {
        /// The expected kind.
        expected: ValueKind,
        /// The actual kind.
        found: ValueKind,
    },
    /// The value has the right kind but does not fit into the target type.
    #[error("conversion error: cannot convert {from} into {into:?}")]
    OutOfRange {
        /// The kind converting from.
        from: ValueKind,
        /// The type converting into.
        into: TypeId,
    },
    /// Deserializing a typed struct out of a value failed.
    #[error("cannot deserialize value: {message}")]
    Deserialize {
        /// Message from the deserializer
        message: String,
    },
}

macro_rules! derive_into_value_prim {
    ($enum:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(t: $ty) -> Self {
                Value::$enum(t.into())
            }
        }
    };
}

macro_rules! derive_try_from_value_int {
    ($ty:ty) => {
        impl TryFrom<Value> for $ty {
            type Error = ConversionError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::Integer(i) => {
                        <$ty>::try_from(i).map_err(|_| ConversionError::OutOfRange {
                            from: ValueKind::Integer,
                            into: TypeId::of::<$ty>(),
                        })
                    }
                    other => Err(ConversionError::WrongKind {
                        expected: ValueKind::Integer,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

macro_rules! derive_try_from_value {
    ($enum:ident, $ty:ty) => {
        impl TryFrom<Value> for $ty {
            type Error = ConversionError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::$enum(inner) => Ok(inner.into()),
                    other => Err(ConversionError::WrongKind {
                        expected: ValueKind::$enum,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

derive_into_value_prim!(Boolean, bool);
derive_into_value_prim!(Integer, i8);
derive_into_value_prim!(Integer, i16);
derive_into_value_prim!(Integer, i32);
derive_into_value_prim!(Integer, i64);
derive_into_value_prim!(Integer, u8);
derive_into_value_prim!(Integer, u16);
derive_into_value_prim!(Integer, u32);
derive_into_value_prim!(Double, f32);
derive_into_value_prim!(Double, f64);
derive_into_value_prim!(String, String);
derive_into_value_prim!(String, &str);
derive_into_value_prim!(String, SmolStr);
derive_into_value_prim!(Bytes, Bytes);
derive_into_value_prim!(Bytes, Vec<u8>);
derive_into_value_prim!(GeoPoint, GeoPoint);
derive_into_value_prim!(Timestamp, Timestamp);
derive_into_value_prim!(Reference, DocumentReference);
derive_into_value_prim!(Map, Map);

derive_try_from_value_int!(i8);
derive_try_from_value_int!(i16);
derive_try_from_value_int!(i32);
derive_try_from_value_int!(i64);
derive_try_from_value_int!(u8);
derive_try_from_value_int!(u16);
derive_try_from_value_int!(u32);
derive_try_from_value_int!(u64);
derive_try_from_value_int!(usize);

derive_try_from_value!(Boolean, bool);
derive_try_from_value!(String, String);
derive_try_from_value!(String, SmolStr);
derive_try_from_value!(Bytes, Bytes);
derive_try_from_value!(GeoPoint, GeoPoint);
derive_try_from_value!(Timestamp, Timestamp);
derive_try_from_value!(Reference, DocumentReference);
derive_try_from_value!(Array, Vec<Value>);
derive_try_from_value!(Map, Map);

impl From<&[u8]> for Value {
    fn from(t: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(t))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<SmolStr>, T: Into<Value>> From<HashMap<K, T>> for Value {
    fn from(map: HashMap<K, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<SmolStr>, T: Into<Value>> FromIterator<(K, T)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Doubles accept integers too, since JSON and hand-written values blur the two.
impl TryFrom<Value> for f64 {
    type Error = ConversionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_f64().ok_or_else(|| ConversionError::WrongKind {
            expected: ValueKind::Double,
            found: value.kind(),
        })
    }
}

impl TryFrom<Value> for () {
    type Error = ConversionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(()),
            other => Err(ConversionError::WrongKind {
                expected: ValueKind::Null,
                found: other.kind(),
            }),
        }
    }
}

/// Plain JSON view of a value.
///
/// Lossy: geo points become `{"latitude", "longitude"}` objects, timestamps
/// and references become strings, bytes become (best-effort UTF-8) strings and
/// non-finite doubles become `null`.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(b),
            Value::Integer(i) => Json::from(i),
            Value::Double(d) => serde_json::Number::from_f64(d).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.to_string()),
            Value::Bytes(b) => Json::String(crate::codec::bytes_to_text(&b)),
            Value::GeoPoint(p) => serde_json::json!({
                "latitude": p.latitude(),
                "longitude": p.longitude(),
            }),
            Value::Timestamp(t) => Json::String(t.as_str().to_owned()),
            Value::Reference(r) => Json::String(r.as_str().to_owned()),
            Value::Array(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            Value::Map(map) => Json::Object(
                map.into_iter()
                    .map(|(k, v)| (k.to_string(), Json::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = EncodeError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        let mut path = FieldPath::default();
        from_json(json, &mut path)
    }
}

fn from_json(json: serde_json::Value, path: &mut FieldPath) -> Result<Value, EncodeError> {
    use serde_json::Value as Json;
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(EncodeError::UnsupportedType {
                    path: path.clone(),
                    found: format!("unsigned integer {n} (larger than i64::MAX)"),
                });
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::String(s.into()),
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                path.push_index(index);
                let value = from_json(item, path);
                path.pop();
                out.push(value?);
            }
            Value::Array(out)
        }
        Json::Object(map) => {
            let mut out = BTreeMap::new();
            for (key, item) in map {
                path.push_key(&key);
                let value = from_json(item, path);
                path.pop();
                out.insert(SmolStr::from(key), value?);
            }
            Value::Map(out)
        }
    })
}

/// Convert any serializable type into a [`Value`], going through JSON.
///
/// Fails with [`EncodeError::UnsupportedType`] for numbers that have no
/// integer or double representation on the wire.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    let json = serde_json::to_value(value)?;
    Value::try_from(json)
}

/// Deserialize a typed value out of a [`Value`], going through JSON.
///
/// See the lossy notes on the `From<Value> for serde_json::Value` impl.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ConversionError> {
    serde_json::from_value(serde_json::Value::from(value)).map_err(|e| {
        ConversionError::Deserialize {
            message: e.to_string(),
        }
    })
}
