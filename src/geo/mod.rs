// ============================================================================
// spark-marker - Geo Module
// Coordinates, pixel points, the map view transform and world wrapping
// ============================================================================

pub mod lng_lat;
pub mod point;
pub mod smart_wrap;
pub mod transform;

// Re-export for convenience
pub use lng_lat::{LngLat, LngLatLike};
pub use point::{Point, PointLike};
pub use smart_wrap::smart_wrap;
pub use transform::Transform;
