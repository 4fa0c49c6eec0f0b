// ============================================================================
// spark-marker - UI Module
// Overlays placed on a map: the marker and the popup it can toggle
// ============================================================================

pub mod marker;
pub mod popup;

// Re-export for convenience
pub use marker::{Marker, MarkerOptions, UpdateOptions};
pub use popup::{AnyPopup, Popup, PopupInner, PopupOptions};
