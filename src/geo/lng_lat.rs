// ============================================================================
// spark-marker - LngLat
// Validated geographic coordinate and the conversion trait that produces it
// ============================================================================

use std::fmt;

use crate::core::constants::{HALF_WORLD_DEGREES, MAX_LATITUDE, WORLD_DEGREES};
use crate::core::error::{GeoError, Result};

// =============================================================================
// LNGLAT
// =============================================================================

/// A geographic coordinate in degrees.
///
/// Longitude is deliberately left unbounded: a marker's wrapped anchor may sit
/// one or more world copies away from `[-180, 180]`. Latitude is validated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    /// Create a coordinate, rejecting non-finite components and latitudes
    /// outside `[-90, 90]`.
    pub fn new(lng: f64, lat: f64) -> Result<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(GeoError::NotFinite { lng, lat });
        }
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Convert anything [`LngLatLike`] into a validated coordinate.
    pub fn convert(value: impl LngLatLike) -> Result<Self> {
        value.into_lng_lat()
    }

    /// Return a copy with the longitude wrapped into `(-180, 180]`.
    pub fn wrap(&self) -> Self {
        Self {
            lng: wrap_lng(self.lng),
            lat: self.lat,
        }
    }

    /// Same latitude, longitude shifted by whole world copies.
    pub(crate) fn shifted(&self, worlds: f64) -> Self {
        Self {
            lng: self.lng + worlds * WORLD_DEGREES,
            lat: self.lat,
        }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LngLat({}, {})", self.lng, self.lat)
    }
}

fn wrap_lng(lng: f64) -> f64 {
    let min = -HALF_WORLD_DEGREES;
    let wrapped = (lng - min).rem_euclid(WORLD_DEGREES) + min;
    if wrapped == min { HALF_WORLD_DEGREES } else { wrapped }
}

// =============================================================================
// LNGLAT LIKE
// =============================================================================

/// Values accepted wherever a coordinate is expected.
///
/// Implemented for `LngLat` itself, `[lng, lat]` arrays and `(lng, lat)`
/// tuples. Every conversion goes through [`LngLat::new`] validation.
pub trait LngLatLike {
    fn into_lng_lat(self) -> Result<LngLat>;
}

impl LngLatLike for LngLat {
    fn into_lng_lat(self) -> Result<LngLat> {
        LngLat::new(self.lng, self.lat)
    }
}

impl LngLatLike for &LngLat {
    fn into_lng_lat(self) -> Result<LngLat> {
        (*self).into_lng_lat()
    }
}

impl LngLatLike for [f64; 2] {
    fn into_lng_lat(self) -> Result<LngLat> {
        LngLat::new(self[0], self[1])
    }
}

impl LngLatLike for (f64, f64) {
    fn into_lng_lat(self) -> Result<LngLat> {
        LngLat::new(self.0, self.1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
