use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};
use std::fmt;

use crate::types::value::Value;

/// An ISO 8601 timestamp, e.g. `"2023-01-01T00:00:00Z"`.
///
/// The string is carried as-is; the store does not validate or normalise it.
/// Use [`Timestamp::to_datetime`] if you need a parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(SmolStr);

impl Timestamp {
    /// Used when a timestamp is built from a value that is not text.
    pub const DEFAULT: &'static str = "2000-01-01T00:00:00Z";

    /// Wrap an ISO 8601 string.
    pub fn new(value: impl Into<SmolStr>) -> Self {
        Self(value.into())
    }

    /// Build a timestamp from a loosely typed value.
    ///
    /// Strings (and existing timestamps) are kept, anything else yields
    /// [`Timestamp::DEFAULT`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(s.clone()),
            Value::Timestamp(t) => t.clone(),
            _ => Self::default(),
        }
    }

    /// Current time in UTC.
    pub fn now() -> Self {
        Self::from_datetime(chrono::Utc::now())
    }

    /// Format a UTC datetime as RFC 3339 with a `Z` suffix.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(
            dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
                .to_smolstr(),
        )
    }

    /// Parse the wrapped string, if it is valid RFC 3339.
    pub fn to_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }

    /// The wrapped string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(SmolStr::new_static(Self::DEFAULT))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn non_text_defaults() {
        assert_eq!(Timestamp::from_value(&Value::Integer(3)).as_str(), Timestamp::DEFAULT);
        assert_eq!(Timestamp::from_value(&Value::Null), Timestamp::default());
    }

    #[test]
    fn text_is_kept_verbatim() {
        let t = Timestamp::from_value(&Value::from("not a date"));
        assert_eq!(t.as_str(), "not a date");
        assert!(t.to_datetime().is_none());
    }

    #[test]
    fn datetime_conversion() {
        let dt = chrono::Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap();
        let t = Timestamp::from(dt);
        assert_eq!(t.as_str(), "2024-02-29T12:30:00Z");
        assert_eq!(t.to_datetime(), Some(dt));
    }
}
