// ============================================================================
// spark-marker - A Positional Map Marker for Rust
// ============================================================================
//
// A marker is an element pinned to a geographic coordinate on an interactive
// map. It listens to the map's `move`, `moveend` and `click` streams, keeps
// its element positioned over the anchor while the map pans and zooms, stays
// visually continuous across the antimeridian when the map renders world
// copies, and can toggle a bound popup.
//
// Everything is single-threaded and callback driven (`Rc`, `Cell`,
// `RefCell`). The host map and the popup are reached through the `AnyMap`
// and `AnyPopup` traits; `Map` and `Popup` are ready-made implementations.
// ============================================================================

pub mod core;
pub mod dom;
pub mod geo;
pub mod map;
pub mod ui;

// Re-export core items at crate root for ergonomic access
pub use crate::core::constants;
pub use crate::core::error::{GeoError, Result};

pub use dom::Element;
pub use geo::{LngLat, LngLatLike, Point, PointLike, Transform, smart_wrap};
pub use map::{
    AnyMap, AsAnyMap, ClickEvent, EventKind, Evented, Listener, Map, MapEvent, MapOptions,
};
pub use ui::{AnyPopup, Marker, MarkerOptions, Popup, PopupOptions, UpdateOptions};

// =============================================================================
// TESTS
// =============================================================================
