// ============================================================================
// spark-marker - Map
// The host map contract a marker attaches to, plus a working implementation
// ============================================================================
//
// A marker only ever talks to a map through `AnyMap`: subscribe/unsubscribe,
// project a coordinate, find the container to render into, and read the
// view transform. `Map` is the crate's own host: it owns a `Transform`, an
// event registry and a canvas container element, and fires `move`/`moveend`
// as its view changes.
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::core::constants::DEFAULT_TAG;
use crate::core::error::Result;
use crate::dom::Element;
use crate::geo::{LngLat, LngLatLike, Point, Transform};
use crate::map::events::{ClickEvent, EventKind, Evented, Listener, MapEvent};

// =============================================================================
// ANY MAP
// =============================================================================

/// Host map interface consumed by markers and popups.
pub trait AnyMap: Any {
    /// Subscribe `listener` to `kind`.
    fn on(&self, kind: EventKind, listener: Listener);

    /// Unsubscribe a listener previously passed to `on`, by identity.
    fn off(&self, kind: EventKind, listener: &Listener);

    /// Screen point of `lng_lat` in viewport pixels.
    fn project(&self, lng_lat: LngLat) -> Point;

    /// Element overlays are appended to.
    fn canvas_container(&self) -> Element;

    /// Current view state.
    fn transform(&self) -> Transform;

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Anything that can hand out a shared `AnyMap`.
pub trait AsAnyMap {
    fn as_any_map(&self) -> Rc<dyn AnyMap>;
}

impl AsAnyMap for Rc<dyn AnyMap> {
    fn as_any_map(&self) -> Rc<dyn AnyMap> {
        self.clone()
    }
}

// =============================================================================
// MAP OPTIONS
// =============================================================================

/// Initial view for a [`Map`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapOptions {
    pub center: LngLat,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
    pub render_world_copies: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        let t = Transform::default();
        Self {
            center: t.center,
            zoom: t.zoom,
            width: t.width,
            height: t.height,
            render_world_copies: t.render_world_copies,
        }
    }
}

impl MapOptions {
    pub fn with_center(mut self, center: impl LngLatLike) -> Result<Self> {
        self.center = LngLat::convert(center)?;
        Ok(self)
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_render_world_copies(mut self, enabled: bool) -> Self {
        self.render_world_copies = enabled;
        self
    }
}

// =============================================================================
// MAP INNER
// =============================================================================

pub struct MapInner {
    transform: RefCell<Transform>,
    container: Element,
    events: Evented,
}

impl AnyMap for MapInner {
    fn on(&self, kind: EventKind, listener: Listener) {
        self.events.on(kind, listener);
    }

    fn off(&self, kind: EventKind, listener: &Listener) {
        self.events.off(kind, listener);
    }

    fn project(&self, lng_lat: LngLat) -> Point {
        self.transform.borrow().location_point(lng_lat)
    }

    fn canvas_container(&self) -> Element {
        self.container.clone()
    }

    fn transform(&self) -> Transform {
        *self.transform.borrow()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// MAP
// =============================================================================

/// A host map with a flat Mercator view.
///
/// View setters apply the change and then fire `move`; call [`Map::settle`]
/// once a gesture is over to fire `moveend`. Listeners always observe the
/// updated transform.
#[derive(Clone)]
pub struct Map {
    inner: Rc<MapInner>,
}

impl Map {
    pub fn new(options: MapOptions) -> Self {
        let container = Element::create(DEFAULT_TAG);
        container.add_class("spark-canvas-container");

        let mut center = options.center;
        if options.render_world_copies {
            center = center.wrap();
        }

        Self {
            inner: Rc::new(MapInner {
                transform: RefCell::new(Transform {
                    center,
                    zoom: options.zoom,
                    width: options.width,
                    height: options.height,
                    render_world_copies: options.render_world_copies,
                }),
                container,
                events: Evented::new(),
            }),
        }
    }

    pub fn inner(&self) -> &Rc<MapInner> {
        &self.inner
    }

    pub fn transform(&self) -> Transform {
        self.inner.transform()
    }

    pub fn center(&self) -> LngLat {
        self.inner.transform.borrow().center
    }

    pub fn project(&self, lng_lat: LngLat) -> Point {
        self.inner.project(lng_lat)
    }

    pub fn canvas_container(&self) -> Element {
        self.inner.canvas_container()
    }

    // =========================================================================
    // View changes
    // =========================================================================

    /// Move the view center and fire `move`.
    ///
    /// With world copies enabled the stored center longitude is wrapped into
    /// `(-180, 180]`, the same thing an interactive pan does continuously.
    pub fn set_center(&self, center: impl LngLatLike) -> Result<()> {
        let center = LngLat::convert(center)?;
        {
            let mut t = self.inner.transform.borrow_mut();
            t.center = if t.render_world_copies {
                center.wrap()
            } else {
                center
            };
            trace!(center = %t.center, "map center changed");
        }
        self.fire(&MapEvent::Move);
        Ok(())
    }

    /// Change the zoom level and fire `move`.
    pub fn set_zoom(&self, zoom: f64) {
        self.inner.transform.borrow_mut().zoom = zoom;
        trace!(zoom, "map zoom changed");
        self.fire(&MapEvent::Move);
    }

    /// Pan by a pixel delta and fire `move`.
    pub fn pan_by(&self, dx: f64, dy: f64) -> Result<()> {
        let (lng, lat) = {
            let t = self.inner.transform.borrow();
            let degrees_per_px = 360.0 / t.world_size();
            // Latitude pans are approximated linearly; callers pan small steps
            (
                t.center.lng + dx * degrees_per_px,
                (t.center.lat - dy * degrees_per_px).clamp(-85.0, 85.0),
            )
        };
        self.set_center([lng, lat])
    }

    /// Fire `moveend`, ending the current gesture.
    pub fn settle(&self) {
        self.fire(&MapEvent::MoveEnd);
    }

    /// Move to `center` and settle immediately.
    pub fn jump_to(&self, center: impl LngLatLike) -> Result<()> {
        self.set_center(center)?;
        self.settle();
        Ok(())
    }

    pub fn set_render_world_copies(&self, enabled: bool) {
        self.inner.transform.borrow_mut().render_world_copies = enabled;
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn on(&self, kind: EventKind, listener: Listener) {
        self.inner.on(kind, listener);
    }

    pub fn off(&self, kind: EventKind, listener: &Listener) {
        self.inner.off(kind, listener);
    }

    pub fn fire(&self, event: &MapEvent) {
        self.inner.events.fire(event);
    }

    /// Fire a `click` whose target is `target`.
    pub fn click(&self, target: &Element, point: Point) {
        self.fire(&MapEvent::Click(ClickEvent {
            target: target.clone(),
            point,
        }));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.events.listener_count(kind)
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new(MapOptions::default())
    }
}

impl AsAnyMap for Map {
    fn as_any_map(&self) -> Rc<dyn AnyMap> {
        self.inner.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn options_build_transform() {
        let map = Map::new(
            MapOptions::default()
                .with_center([10.0, 20.0])
                .unwrap()
                .with_zoom(3.0)
                .with_size(800.0, 600.0)
                .with_render_world_copies(false),
        );
        let t = map.transform();
        assert_eq!(t.center, LngLat::new(10.0, 20.0).unwrap());
        assert_eq!(t.zoom, 3.0);
        assert_eq!(t.width, 800.0);
        assert_eq!(t.height, 600.0);
        assert!(!t.render_world_copies);
    }

    #[test]
    fn invalid_center_is_rejected() {
        assert!(MapOptions::default().with_center([0.0, 95.0]).is_err());

        let map = Map::default();
        assert!(map.set_center([0.0, f64::NAN]).is_err());
        assert_eq!(map.center(), LngLat::new(0.0, 0.0).unwrap());
    }

    #[test]
    fn set_center_fires_move_after_updating() {
        let map = Map::default();
        let seen = Rc::new(Cell::new(f64::NAN));
        let listener: Listener = {
            let map = map.clone();
            let seen = seen.clone();
            Rc::new(move |_: &MapEvent| seen.set(map.center().lng))
        };
        map.on(EventKind::Move, listener.clone());

        map.set_center([42.0, 0.0]).unwrap();
        assert_eq!(seen.get(), 42.0);

        map.off(EventKind::Move, &listener);
    }

    #[test]
    fn center_wraps_only_with_world_copies() {
        let map = Map::default();
        map.set_center([190.0, 0.0]).unwrap();
        assert!((map.center().lng + 170.0).abs() < 1e-9);

        map.set_render_world_copies(false);
        map.set_center([190.0, 0.0]).unwrap();
        assert_eq!(map.center().lng, 190.0);
    }

    #[test]
    fn jump_to_fires_move_then_moveend() {
        let map = Map::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::Move, EventKind::MoveEnd] {
            let order = order.clone();
            map.on(
                kind,
                Rc::new(move |event: &MapEvent| order.borrow_mut().push(event.kind())),
            );
        }

        map.jump_to([5.0, 5.0]).unwrap();
        assert_eq!(*order.borrow(), vec![EventKind::Move, EventKind::MoveEnd]);
    }

    #[test]
    fn pan_by_moves_center_in_pixels() {
        let map = Map::new(MapOptions::default().with_zoom(1.0));
        // 1024px world: 1024px = 360 degrees
        map.pan_by(256.0, 0.0).unwrap();
        assert!((map.center().lng - 90.0).abs() < 1e-9);
    }

    #[test]
    fn project_delegates_to_transform() {
        let map = Map::default();
        let ll = LngLat::new(45.0, 10.0).unwrap();
        assert_eq!(map.project(ll), map.transform().location_point(ll));
        assert_eq!(map.project(map.center()), Point::new(256.0, 256.0));
    }

    #[test]
    fn as_any_map_shares_state() {
        let map = Map::default();
        let any = map.as_any_map();
        map.set_zoom(2.0);
        assert_eq!(any.transform().zoom, 2.0);
        assert!(any.as_any().downcast_ref::<MapInner>().is_some());
        assert_eq!(any.canvas_container(), map.canvas_container());
    }
}
