// ============================================================================
// spark-marker - Marker
// A point of interest whose element follows a geographic anchor on a map
// ============================================================================
//
// The marker keeps three pieces of derived state next to its anchor:
// - the wrapped anchor: the world copy of the anchor currently on screen
// - the screen position: where the element was last placed
// - the map: a weak back-reference, present only while attached
//
// Every position update runs under an `UpdateOptions` policy:
//
//   trigger              wrap   round
//   attach / set_lng_lat  no     yes    settled, exact integer placement
//   map `move`            yes    no     mid-gesture, sub-pixel to avoid judder
//   map `moveend`         yes    yes    gesture over, snap to whole pixels
//
// World wrapping needs the previous screen position as context, which is why
// the wrapped anchor and position are cached instead of recomputed.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::core::constants::MARKER_CLASS;
use crate::core::error::Result;
use crate::dom::{self, Element};
use crate::geo::{LngLat, LngLatLike, Point, PointLike, smart_wrap};
use crate::map::{AnyMap, AsAnyMap, EventKind, Listener, MapEvent};
use crate::ui::popup::AnyPopup;

// =============================================================================
// UPDATE OPTIONS
// =============================================================================

/// Policy for a single position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Re-pick the world copy of the anchor closest to the last position
    pub wrap: bool,
    /// Snap the final position to whole pixels
    pub round: bool,
}

impl UpdateOptions {
    /// Attach or explicit anchor change
    pub const SETTLED: Self = Self {
        wrap: false,
        round: true,
    };

    /// Continuous pan/zoom
    pub const MOVING: Self = Self {
        wrap: true,
        round: false,
    };

    /// End of a pan/zoom gesture
    pub const MOVE_END: Self = Self {
        wrap: true,
        round: true,
    };
}

// =============================================================================
// MARKER OPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarkerOptions {
    /// Pixel offset applied to the projected anchor. Negative values move the
    /// element left and up.
    pub offset: Point,
}

impl MarkerOptions {
    pub fn with_offset(mut self, offset: impl PointLike) -> Self {
        self.offset = Point::convert(offset);
        self
    }
}

// =============================================================================
// MARKER INNER
// =============================================================================

/// Listeners created once per marker so `remove` can unsubscribe exactly
/// what `add_to` subscribed.
struct MarkerListeners {
    on_move: Listener,
    on_moveend: Listener,
    on_map_click: Listener,
}

pub(crate) struct MarkerInner {
    element: Element,
    offset: Point,

    /// Canonical, user-set coordinate
    lng_lat: Cell<Option<LngLat>>,

    /// World copy of `lng_lat` used for projection; reset by `set_lng_lat`
    wrapped_lng_lat: Cell<Option<LngLat>>,

    /// Last applied screen position; `None` while detached
    pos: Cell<Option<Point>>,

    /// Host map (Weak: the map is never kept alive by its markers)
    map: RefCell<Option<Weak<dyn AnyMap>>>,

    popup: RefCell<Option<Rc<dyn AnyPopup>>>,

    listeners: MarkerListeners,
}

impl MarkerInner {
    fn new(element: Option<Element>, options: MarkerOptions) -> Rc<Self> {
        let element = element.unwrap_or_default();
        element.add_class(MARKER_CLASS);

        Rc::new_cyclic(|weak: &Weak<MarkerInner>| {
            let listeners = MarkerListeners {
                on_move: {
                    let weak = weak.clone();
                    Rc::new(move |_: &MapEvent| {
                        if let Some(marker) = weak.upgrade() {
                            marker.update(UpdateOptions::MOVING);
                        }
                    })
                },
                on_moveend: {
                    let weak = weak.clone();
                    Rc::new(move |_: &MapEvent| {
                        if let Some(marker) = weak.upgrade() {
                            marker.update(UpdateOptions::MOVE_END);
                        }
                    })
                },
                on_map_click: {
                    let weak = weak.clone();
                    Rc::new(move |event: &MapEvent| {
                        if let Some(marker) = weak.upgrade() {
                            marker.on_map_click(event);
                        }
                    })
                },
            };

            Self {
                element,
                offset: options.offset,
                lng_lat: Cell::new(None),
                wrapped_lng_lat: Cell::new(None),
                pos: Cell::new(None),
                map: RefCell::new(None),
                popup: RefCell::new(None),
                listeners,
            }
        })
    }

    fn attached_map(&self) -> Option<Rc<dyn AnyMap>> {
        self.map.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn bound_popup(&self) -> Option<Rc<dyn AnyPopup>> {
        self.popup.borrow().clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn add_to(&self, map: &Rc<dyn AnyMap>) {
        self.remove();

        *self.map.borrow_mut() = Some(Rc::downgrade(map));
        map.canvas_container().append_child(&self.element);
        map.on(EventKind::Move, self.listeners.on_move.clone());
        map.on(EventKind::MoveEnd, self.listeners.on_moveend.clone());
        self.update(UpdateOptions::SETTLED);

        // Listening on the map rather than on the element: a popup's own
        // close-on-click listener on the map would otherwise close the popup
        // right after the marker opened it.
        map.on(EventKind::Click, self.listeners.on_map_click.clone());

        debug!(lng_lat = ?self.lng_lat.get(), pos = ?self.pos.get(), "marker attached");
    }

    fn remove(&self) {
        // Detach from the map first so no callback can act on a half-removed marker
        let map = self.map.borrow_mut().take();
        if let Some(map) = map {
            if let Some(map) = map.upgrade() {
                map.off(EventKind::Click, &self.listeners.on_map_click);
                map.off(EventKind::Move, &self.listeners.on_move);
                map.off(EventKind::MoveEnd, &self.listeners.on_moveend);
            }
            debug!(lng_lat = ?self.lng_lat.get(), "marker detached");
        }
        self.pos.set(None);

        self.element.remove();

        if let Some(popup) = self.bound_popup() {
            popup.remove();
        }
    }

    // =========================================================================
    // Anchor
    // =========================================================================

    fn set_lng_lat(&self, lng_lat: LngLat) {
        self.lng_lat.set(Some(lng_lat));
        self.wrapped_lng_lat.set(None);

        if let Some(popup) = self.bound_popup() {
            popup.set_lng_lat(lng_lat);
        }

        self.update(UpdateOptions::SETTLED);
    }

    // =========================================================================
    // Popup
    // =========================================================================

    fn set_popup(&self, popup: Option<Rc<dyn AnyPopup>>) {
        let previous = self.popup.borrow_mut().take();
        if let Some(previous) = previous {
            previous.remove();
        }

        if let Some(popup) = popup {
            if let Some(lng_lat) = self.lng_lat.get() {
                popup.set_lng_lat(lng_lat);
            }
            *self.popup.borrow_mut() = Some(popup);
        }

        debug!(bound = self.popup.borrow().is_some(), "marker popup set");
    }

    fn toggle_popup(&self) {
        let Some(popup) = self.bound_popup() else {
            return;
        };

        if popup.is_open() {
            popup.remove();
        } else if let Some(map) = self.attached_map() {
            popup.add_to(&map);
        } else {
            debug!("marker is not on a map; popup stays closed");
        }
    }

    fn on_map_click(&self, event: &MapEvent) {
        let MapEvent::Click(click) = event else {
            return;
        };

        if self.popup.borrow().is_none() {
            return;
        }
        if self.element.contains(&click.target) {
            self.toggle_popup();
        }
    }

    // =========================================================================
    // Position update
    // =========================================================================

    fn update(&self, options: UpdateOptions) {
        // Events may still arrive after detaching (dispatch snapshots)
        let Some(map) = self.attached_map() else {
            trace!(?options, "marker update skipped: no map");
            return;
        };
        let Some(lng_lat) = self.lng_lat.get() else {
            trace!(?options, "marker update skipped: no anchor");
            return;
        };

        let mut wrapped = self.wrapped_lng_lat.get().unwrap_or(lng_lat);

        if options.wrap {
            let transform = map.transform();
            if transform.render_world_copies {
                wrapped = smart_wrap(wrapped, self.pos.get(), &transform);
            }
        }
        self.wrapped_lng_lat.set(Some(wrapped));

        let mut pos = map.project(wrapped) + self.offset;

        // Rounding every `move` makes zooming stutter, so only settled
        // updates snap to whole pixels.
        if options.round {
            pos = pos.round();
        }

        self.pos.set(Some(pos));
        dom::set_translate(&self.element, pos.x, pos.y);

        trace!(?options, %wrapped, %pos, "marker position updated");
    }
}

// =============================================================================
// MARKER
// =============================================================================

/// A map marker.
///
/// `Marker` is a shared handle; clones refer to the same marker. A marker
/// starts detached: set its anchor with [`Marker::set_lng_lat`] and put it on
/// a map with [`Marker::add_to`]. Methods return `&Self` for chaining.
///
/// Maps only hold weak references to their markers. Dropping the last handle
/// removes the marker from its map.
///
/// # Example
///
/// ```ignore
/// let map = Map::new(MapOptions::default().with_zoom(3.0));
/// let marker = Marker::new(None, MarkerOptions::default().with_offset([-12.0, -24.0]));
/// marker.set_lng_lat([30.5, 50.5])?.add_to(&map);
///
/// map.set_center([31.0, 50.0])?; // `move`: sub-pixel placement
/// map.settle();                  // `moveend`: whole pixels
/// ```
#[derive(Clone)]
pub struct Marker {
    inner: Rc<MarkerInner>,
}

impl Marker {
    /// Create a detached marker.
    ///
    /// When `element` is `None` a `div` is created. Either way the element
    /// receives the `spark-marker` class.
    pub fn new(element: Option<Element>, options: MarkerOptions) -> Self {
        Self {
            inner: MarkerInner::new(element, options),
        }
    }

    /// Attach to `map`, detaching from any previous map first.
    ///
    /// The element is appended to the map's canvas container, the marker
    /// subscribes to `move`, `moveend` and `click`, and its position is
    /// computed immediately as a settled update.
    pub fn add_to(&self, map: &impl AsAnyMap) -> &Self {
        self.inner.add_to(&map.as_any_map());
        self
    }

    /// Detach from the map, drop the element from its parent and close the
    /// bound popup. Calling it again is a no-op.
    pub fn remove(&self) -> &Self {
        self.inner.remove();
        self
    }

    /// The canonical anchor as last set, never a wrapped copy.
    pub fn lng_lat(&self) -> Option<LngLat> {
        self.inner.lng_lat.get()
    }

    /// Replace the anchor and reposition immediately.
    ///
    /// Resets the wrapped anchor and forwards the new anchor to the bound
    /// popup. Invalid coordinates are rejected by [`LngLat::convert`] before
    /// any state changes.
    pub fn set_lng_lat(&self, lng_lat: impl LngLatLike) -> Result<&Self> {
        let lng_lat = LngLat::convert(lng_lat)?;
        self.inner.set_lng_lat(lng_lat);
        Ok(self)
    }

    pub fn element(&self) -> Element {
        self.inner.element.clone()
    }

    pub fn offset(&self) -> Point {
        self.inner.offset
    }

    /// Screen position last applied to the element, `None` while detached.
    pub fn position(&self) -> Option<Point> {
        self.inner.pos.get()
    }

    /// World copy of the anchor currently used for projection.
    pub fn wrapped_lng_lat(&self) -> Option<LngLat> {
        self.inner.wrapped_lng_lat.get()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached_map().is_some()
    }

    /// Bind `popup`, closing and releasing any previously bound popup.
    /// `None` just clears the binding.
    pub fn set_popup(&self, popup: Option<Rc<dyn AnyPopup>>) -> &Self {
        self.inner.set_popup(popup);
        self
    }

    pub fn popup(&self) -> Option<Rc<dyn AnyPopup>> {
        self.inner.bound_popup()
    }

    /// Close the bound popup if open, otherwise open it on this marker's map.
    ///
    /// Without a bound popup this does nothing; it still returns `self`.
    pub fn toggle_popup(&self) -> &Self {
        self.inner.toggle_popup();
        self
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::new(None, MarkerOptions::default())
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        // Last handle gone: unsubscribe so the map does not keep dead listeners
        if Rc::strong_count(&self.inner) == 1 {
            self.inner.remove();
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("lng_lat", &self.inner.lng_lat.get())
            .field("wrapped_lng_lat", &self.inner.wrapped_lng_lat.get())
            .field("pos", &self.inner.pos.get())
            .field("offset", &self.inner.offset)
            .field("attached", &self.is_attached())
            .field("popup", &self.inner.popup.borrow().is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Transform;
    use crate::map::{Evented, Map, MapOptions};
    use crate::ui::popup::Popup;
    use std::any::Any;

    /// Mock host map that records subscription traffic
    struct RecordingMap {
        events: Evented,
        container: Element,
        transform: Transform,
        on_calls: Cell<usize>,
        off_calls: Cell<usize>,
    }

    impl RecordingMap {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                events: Evented::new(),
                container: Element::default(),
                transform: Transform::default(),
                on_calls: Cell::new(0),
                off_calls: Cell::new(0),
            })
        }
    }

    impl AnyMap for RecordingMap {
        fn on(&self, kind: EventKind, listener: Listener) {
            self.on_calls.set(self.on_calls.get() + 1);
            self.events.on(kind, listener);
        }

        fn off(&self, kind: EventKind, listener: &Listener) {
            self.off_calls.set(self.off_calls.get() + 1);
            self.events.off(kind, listener);
        }

        fn project(&self, lng_lat: LngLat) -> Point {
            self.transform.location_point(lng_lat)
        }

        fn canvas_container(&self) -> Element {
            self.container.clone()
        }

        fn transform(&self) -> Transform {
            self.transform
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn ll(lng: f64, lat: f64) -> LngLat {
        LngLat::new(lng, lat).unwrap()
    }

    #[test]
    fn update_policies() {
        assert_eq!(
            UpdateOptions::SETTLED,
            UpdateOptions {
                wrap: false,
                round: true
            }
        );
        assert!(UpdateOptions::MOVING.wrap && !UpdateOptions::MOVING.round);
        assert!(UpdateOptions::MOVE_END.wrap && UpdateOptions::MOVE_END.round);
    }

    #[test]
    fn new_marker_is_detached() {
        let marker = Marker::default();
        assert!(!marker.is_attached());
        assert_eq!(marker.position(), None);
        assert_eq!(marker.lng_lat(), None);
        assert!(marker.element().has_class(MARKER_CLASS));
        assert_eq!(marker.offset(), Point::ZERO);
    }

    #[test]
    fn supplied_element_is_used() {
        let el = Element::create("img");
        let marker = Marker::new(Some(el.clone()), MarkerOptions::default());
        assert_eq!(marker.element(), el);
        assert!(el.has_class(MARKER_CLASS));
    }

    #[test]
    fn add_to_subscribes_three_listeners_and_places_element() {
        let rec = RecordingMap::new();
        let map: Rc<dyn AnyMap> = rec.clone();
        let marker = Marker::default();
        marker.set_lng_lat([0.0, 0.0]).unwrap().add_to(&map);

        assert_eq!(rec.on_calls.get(), 3);
        for kind in EventKind::ALL {
            assert_eq!(rec.events.listener_count(kind), 1, "{}", kind);
        }
        assert_eq!(marker.element().parent(), Some(rec.container.clone()));
        assert_eq!(marker.position(), Some(Point::new(256.0, 256.0)));
        assert_eq!(
            marker.element().transform().as_deref(),
            Some("translate(256px, 256px)")
        );
    }

    #[test]
    fn remove_twice_unsubscribes_once() {
        let rec = RecordingMap::new();
        let map: Rc<dyn AnyMap> = rec.clone();
        let marker = Marker::default();
        marker.set_lng_lat([10.0, 10.0]).unwrap().add_to(&map);

        marker.remove();
        assert_eq!(rec.off_calls.get(), 3);
        marker.remove();
        assert_eq!(rec.off_calls.get(), 3);

        for kind in EventKind::ALL {
            assert_eq!(rec.events.listener_count(kind), 0);
        }
        assert!(!marker.is_attached());
        assert_eq!(marker.position(), None);
        assert!(marker.element().parent().is_none());
    }

    #[test]
    fn readding_to_same_map_does_not_duplicate() {
        let rec = RecordingMap::new();
        let map: Rc<dyn AnyMap> = rec.clone();
        let marker = Marker::default();
        marker.add_to(&map).add_to(&map);

        for kind in EventKind::ALL {
            assert_eq!(rec.events.listener_count(kind), 1);
        }
        assert_eq!(rec.container.children().len(), 1);
    }

    #[test]
    fn attaching_without_anchor_defers_placement() {
        let map = Map::default();
        let marker = Marker::default();
        marker.add_to(&map);
        assert!(marker.is_attached());
        assert_eq!(marker.position(), None);
        assert_eq!(marker.element().transform(), None);

        marker.set_lng_lat([0.0, 0.0]).unwrap();
        assert_eq!(marker.position(), Some(Point::new(256.0, 256.0)));
    }

    #[test]
    fn set_lng_lat_before_attach_only_stores() {
        let marker = Marker::default();
        marker.set_lng_lat([5.0, 6.0]).unwrap();
        assert_eq!(marker.lng_lat(), Some(ll(5.0, 6.0)));
        assert_eq!(marker.position(), None);
        assert_eq!(marker.element().transform(), None);
    }

    #[test]
    fn invalid_lng_lat_leaves_state_alone() {
        let map = Map::default();
        let marker = Marker::default();
        marker.set_lng_lat([1.0, 1.0]).unwrap().add_to(&map);
        let before = marker.position();

        assert!(marker.set_lng_lat([1.0, 100.0]).is_err());
        assert_eq!(marker.lng_lat(), Some(ll(1.0, 1.0)));
        assert_eq!(marker.position(), before);
    }

    #[test]
    fn set_lng_lat_resets_wrapped_anchor() {
        let map = Map::new(MapOptions::default().with_zoom(2.0).with_size(800.0, 600.0));
        let marker = Marker::default();
        marker.set_lng_lat([179.0, 0.0]).unwrap().add_to(&map);

        // Drag across the antimeridian so the wrapped anchor drifts
        map.set_center([190.0, 0.0]).unwrap();
        assert_eq!(marker.wrapped_lng_lat(), Some(ll(-181.0, 0.0)));

        marker.set_lng_lat([20.0, 0.0]).unwrap();
        assert_eq!(marker.wrapped_lng_lat(), Some(ll(20.0, 0.0)));
        assert_eq!(marker.lng_lat(), Some(ll(20.0, 0.0)));
    }

    #[test]
    fn offset_is_applied_after_projection() {
        let map = Map::default();
        let marker = Marker::new(None, MarkerOptions::default().with_offset([-10.0, 4.0]));
        marker.set_lng_lat([0.0, 0.0]).unwrap().add_to(&map);
        assert_eq!(marker.position(), Some(Point::new(246.0, 260.0)));
    }

    #[test]
    fn dropped_map_turns_updates_into_no_ops() {
        let marker = Marker::default();
        {
            let map = Map::default();
            marker.set_lng_lat([0.0, 0.0]).unwrap().add_to(&map);
        }
        assert!(!marker.is_attached());
        // Must not panic
        marker.set_lng_lat([3.0, 3.0]).unwrap();
        marker.remove();
    }

    #[test]
    fn dropping_last_handle_detaches() {
        let map = Map::default();
        {
            let marker = Marker::default();
            marker.set_lng_lat([0.0, 0.0]).unwrap().add_to(&map);
            let clone = marker.clone();
            drop(clone);
            assert_eq!(map.listener_count(EventKind::Move), 1);
        }
        for kind in EventKind::ALL {
            assert_eq!(map.listener_count(kind), 0);
        }
        assert!(map.canvas_container().children().is_empty());
    }

    #[test]
    fn toggle_without_popup_is_noop() {
        let map = Map::default();
        let marker = Marker::default();
        marker.add_to(&map).toggle_popup().toggle_popup();
        assert!(marker.popup().is_none());
    }

    #[test]
    fn toggle_while_detached_keeps_popup_closed() {
        let marker = Marker::default();
        let popup = Popup::default();
        marker.set_popup(Some(popup.as_any_popup()));
        marker.toggle_popup();
        assert!(!popup.is_open());
    }

    #[test]
    fn remove_closes_popup_but_keeps_binding() {
        let map = Map::default();
        let marker = Marker::default();
        let popup = Popup::default();
        marker
            .set_lng_lat([0.0, 0.0])
            .unwrap()
            .set_popup(Some(popup.as_any_popup()))
            .add_to(&map)
            .toggle_popup();
        assert!(popup.is_open());

        marker.remove();
        assert!(!popup.is_open());
        assert!(marker.popup().is_some_and(|p| popup.is(&p)));
    }

    #[test]
    fn debug_output_mentions_state() {
        let marker = Marker::default();
        let text = format!("{:?}", marker);
        assert!(text.contains("attached: false"));
    }
}
