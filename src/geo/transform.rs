// ============================================================================
// spark-marker - Transform
// Web Mercator view state: where the map is looking and how big it is
// ============================================================================
//
// This is a flat (no pitch, no bearing) projection. It is all a marker needs
// from a host map: a way to turn a coordinate into a screen point, the view
// center and size for world-wrap decisions, and the world copies flag.
// ============================================================================

use std::f64::consts::PI;

use crate::core::constants::{HALF_WORLD_DEGREES, MAX_MERCATOR_LATITUDE, TILE_SIZE, WORLD_DEGREES};
use crate::geo::lng_lat::LngLat;
use crate::geo::point::Point;

/// Snapshot of a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Geographic coordinate at the middle of the viewport
    pub center: LngLat,
    /// Zoom level; each step doubles the world size
    pub zoom: f64,
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels
    pub height: f64,
    /// Whether the world is drawn repeatedly side by side
    pub render_world_copies: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            center: LngLat { lng: 0.0, lat: 0.0 },
            zoom: 0.0,
            width: TILE_SIZE,
            height: TILE_SIZE,
            render_world_copies: true,
        }
    }
}

impl Transform {
    /// World edge length in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Mercator x in pixels from the world's west edge.
    pub fn lng_x(&self, lng: f64) -> f64 {
        (HALF_WORLD_DEGREES + lng) * self.world_size() / WORLD_DEGREES
    }

    /// Mercator y in pixels from the world's north edge.
    ///
    /// Latitudes beyond the Mercator limit are clamped to it, so the poles
    /// land on the world's top and bottom edges.
    pub fn lat_y(&self, lat: f64) -> f64 {
        let lat = lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let y = HALF_WORLD_DEGREES / PI * (PI / 4.0 + lat * PI / WORLD_DEGREES).tan().ln();
        (HALF_WORLD_DEGREES - y) * self.world_size() / WORLD_DEGREES
    }

    /// Screen position of `lng_lat` relative to the viewport's top-left corner.
    pub fn location_point(&self, lng_lat: LngLat) -> Point {
        let center = Point::new(self.lng_x(self.center.lng), self.lat_y(self.center.lat));
        let world = Point::new(self.lng_x(lng_lat.lng), self.lat_y(lng_lat.lat));
        world - center + Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether `point` lies inside the viewport rectangle (edges included).
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }
}

// =============================================================================
// TESTS
// =============================================================================
