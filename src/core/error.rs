// ============================================================================
// spark-marker - Errors
// Validation failures raised by the geographic value types
// ============================================================================

use thiserror::Error;

/// Errors raised when converting raw values into geographic coordinates.
///
/// The marker never produces these itself. They surface unmodified from
/// `LngLat::convert` through `Marker::set_lng_lat` and the map's center setters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside of `[-90, 90]`
    #[error("invalid LngLat latitude value {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    /// A component was NaN or infinite
    #[error("invalid LngLat object: ({lng}, {lat})")]
    NotFinite { lng: f64, lat: f64 },
}

pub type Result<T> = std::result::Result<T, GeoError>;
