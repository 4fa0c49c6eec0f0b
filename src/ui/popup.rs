// ============================================================================
// spark-marker - Popup
// The popup contract a marker coordinates with, and a basic implementation
// ============================================================================
//
// A popup is "open" exactly while it is attached to a map. This module does
// not lay the popup out; it owns an element, tracks its anchor and manages
// its map subscription, which is all a marker needs from it.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::core::constants::{DEFAULT_TAG, POPUP_CLASS};
use crate::dom::Element;
use crate::geo::LngLat;
use crate::map::{AnyMap, AsAnyMap, EventKind, Listener, MapEvent};

// =============================================================================
// ANY POPUP
// =============================================================================

/// Popup interface consumed by [`Marker`](crate::Marker).
pub trait AnyPopup: Any {
    /// Move the popup's anchor.
    fn set_lng_lat(&self, lng_lat: LngLat);

    /// Current anchor, if one was set.
    fn lng_lat(&self) -> Option<LngLat>;

    /// Open the popup on `map`.
    fn add_to(&self, map: &Rc<dyn AnyMap>);

    /// Close the popup. Safe to call when already closed.
    fn remove(&self);

    fn is_open(&self) -> bool;

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// POPUP OPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PopupOptions {
    /// Close the popup on any map click
    pub close_on_click: bool,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            close_on_click: true,
        }
    }
}

impl PopupOptions {
    pub fn with_close_on_click(mut self, enabled: bool) -> Self {
        self.close_on_click = enabled;
        self
    }
}

// =============================================================================
// POPUP INNER
// =============================================================================

pub struct PopupInner {
    options: PopupOptions,
    element: Element,
    lng_lat: Cell<Option<LngLat>>,
    map: RefCell<Option<Weak<dyn AnyMap>>>,
    /// Stable identity for the close-on-click subscription
    on_click_close: Listener,
}

impl PopupInner {
    fn new(options: PopupOptions) -> Rc<Self> {
        let element = Element::create(DEFAULT_TAG);
        element.add_class(POPUP_CLASS);

        Rc::new_cyclic(|weak: &Weak<PopupInner>| {
            let weak = weak.clone();
            Self {
                options,
                element,
                lng_lat: Cell::new(None),
                map: RefCell::new(None),
                on_click_close: Rc::new(move |_: &MapEvent| {
                    if let Some(popup) = weak.upgrade() {
                        popup.remove();
                    }
                }),
            }
        })
    }
}

impl AnyPopup for PopupInner {
    fn set_lng_lat(&self, lng_lat: LngLat) {
        self.lng_lat.set(Some(lng_lat));
    }

    fn lng_lat(&self) -> Option<LngLat> {
        self.lng_lat.get()
    }

    fn add_to(&self, map: &Rc<dyn AnyMap>) {
        self.remove();

        *self.map.borrow_mut() = Some(Rc::downgrade(map));
        map.canvas_container().append_child(&self.element);

        if self.options.close_on_click {
            map.on(EventKind::Click, self.on_click_close.clone());
        }
        debug!(lng_lat = ?self.lng_lat.get(), "popup opened");
    }

    fn remove(&self) {
        let map = self.map.borrow_mut().take();
        let Some(map) = map else {
            return;
        };

        if let Some(map) = map.upgrade() {
            map.off(EventKind::Click, &self.on_click_close);
        }
        self.element.remove();
        debug!("popup closed");
    }

    fn is_open(&self) -> bool {
        self.map.borrow().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// POPUP
// =============================================================================

/// Shared handle to a popup.
#[derive(Clone)]
pub struct Popup {
    inner: Rc<PopupInner>,
}

impl Popup {
    pub fn new(options: PopupOptions) -> Self {
        Self {
            inner: PopupInner::new(options),
        }
    }

    pub fn inner(&self) -> &Rc<PopupInner> {
        &self.inner
    }

    /// This popup as the trait object a marker binds.
    pub fn as_any_popup(&self) -> Rc<dyn AnyPopup> {
        self.inner.clone()
    }

    pub fn element(&self) -> Element {
        self.inner.element.clone()
    }

    pub fn options(&self) -> PopupOptions {
        self.inner.options
    }

    pub fn set_lng_lat(&self, lng_lat: LngLat) -> &Self {
        self.inner.set_lng_lat(lng_lat);
        self
    }

    pub fn lng_lat(&self) -> Option<LngLat> {
        self.inner.lng_lat()
    }

    pub fn add_to(&self, map: &impl AsAnyMap) -> &Self {
        self.inner.add_to(&map.as_any_map());
        self
    }

    pub fn remove(&self) -> &Self {
        self.inner.remove();
        self
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Whether `other` is a handle to this same popup.
    pub fn is(&self, other: &Rc<dyn AnyPopup>) -> bool {
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(other) as *const ()
    }
}

impl Default for Popup {
    fn default() -> Self {
        Self::new(PopupOptions::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
