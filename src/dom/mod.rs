// ============================================================================
// spark-marker - DOM Module
// Element tree the marker and popup render into
// ============================================================================

pub mod element;

pub use element::Element;

/// Translate `element` by `x`/`y` pixels.
pub fn set_translate(element: &Element, x: f64, y: f64) {
    element.set_transform(format!("translate({}px, {}px)", x, y));
}
