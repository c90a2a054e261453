use serde::{Deserialize, Deserializer, Serialize};

use crate::types::value::Value;

/// A point on the globe.
///
/// Latitude lies in `[-90, 90]` (positive is north), longitude in
/// `[-180, 180]` (positive is east). Out of range input is clamped to the poles
/// or the antimeridian; input that is not a number lands on the equator or the
/// prime meridian.
///
/// ```
/// use fireside_common::GeoPoint;
///
/// let p = GeoPoint::new(200.0, -300.0);
/// assert_eq!((p.latitude(), p.longitude()), (90.0, -180.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Smallest accepted latitude.
    pub const MIN_LATITUDE: f64 = -90.0;
    /// Largest accepted latitude.
    pub const MAX_LATITUDE: f64 = 90.0;
    /// Smallest accepted longitude.
    pub const MIN_LONGITUDE: f64 = -180.0;
    /// Largest accepted longitude.
    pub const MAX_LONGITUDE: f64 = 180.0;

    /// Build a point, clamping each coordinate into range. `NaN` becomes `0`.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: clamp_or_zero(latitude, Self::MIN_LATITUDE, Self::MAX_LATITUDE),
            longitude: clamp_or_zero(longitude, Self::MIN_LONGITUDE, Self::MAX_LONGITUDE),
        }
    }

    /// Build a point from loosely typed values.
    ///
    /// Integers and doubles are used as coordinates (then clamped); any other
    /// kind of value defaults that coordinate to `0`.
    pub fn from_values(latitude: &Value, longitude: &Value) -> Self {
        Self::new(numeric(latitude), numeric(longitude))
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            latitude: f64,
            #[serde(default)]
            longitude: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self::new(raw.latitude, raw.longitude))
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

fn numeric(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Double(d) => *d,
        _ => 0.0,
    }
}
