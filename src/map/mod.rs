// ============================================================================
// spark-marker - Map Module
// Host map contract, event registry and the crate's own map implementation
// ============================================================================

pub mod events;
#[allow(clippy::module_inception)]
pub mod map;

// Re-export for convenience
pub use events::{ClickEvent, EventKind, Evented, Listener, MapEvent};
pub use map::{AnyMap, AsAnyMap, Map, MapInner, MapOptions};
