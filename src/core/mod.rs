// ============================================================================
// spark-marker - Core Module
// Constants and error types shared by every other module
// ============================================================================

pub mod constants;
pub mod error;

// Re-export commonly used items
pub use constants::*;
pub use error::{GeoError, Result};
