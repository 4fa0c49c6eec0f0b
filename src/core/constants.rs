// ============================================================================
// spark-marker - Constants
// Event names, class names and world geometry shared across the crate
// ============================================================================

// =============================================================================
// EVENT NAMES
// =============================================================================

/// Fired repeatedly while the map is panning or zooming
pub const EVENT_MOVE: &str = "move";

/// Fired once when a pan/zoom gesture settles
pub const EVENT_MOVEEND: &str = "moveend";

/// Fired for a click anywhere on the map surface
pub const EVENT_CLICK: &str = "click";

// =============================================================================
// ELEMENT CLASSES
// =============================================================================

/// Class added to every marker element
pub const MARKER_CLASS: &str = "spark-marker";

/// Class added to every popup element
pub const POPUP_CLASS: &str = "spark-popup";

/// Default tag for elements created by the crate
pub const DEFAULT_TAG: &str = "div";

// =============================================================================
// WORLD GEOMETRY
// =============================================================================

/// Edge length in pixels of the whole world at zoom 0
pub const TILE_SIZE: f64 = 512.0;

/// Longitude span of one world copy
pub const WORLD_DEGREES: f64 = 360.0;

/// Half of [`WORLD_DEGREES`]; the antimeridian sits at +/- this value
pub const HALF_WORLD_DEGREES: f64 = 180.0;

/// Largest latitude accepted by `LngLat::new`
pub const MAX_LATITUDE: f64 = 90.0;

/// Latitude at which Web Mercator makes the world square; projection clamps
/// to it since the poles map to infinity
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051129;

// =============================================================================
// TESTS
// =============================================================================
