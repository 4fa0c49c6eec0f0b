// ============================================================================
// spark-marker - Map Events
// Event kinds, payloads and the listener registry behind `on`/`off`/`fire`
// ============================================================================
//
// Listeners are `Rc<dyn Fn>` and are compared by pointer identity, so a
// subscriber must keep the exact `Listener` it registered in order to
// unsubscribe it later. Dispatch iterates over a snapshot of the listener
// list (collect-then-call): a listener may subscribe or unsubscribe anything,
// itself included, while an event is being delivered.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::constants::{EVENT_CLICK, EVENT_MOVE, EVENT_MOVEEND};
use crate::dom::Element;
use crate::geo::Point;

// =============================================================================
// EVENT TYPES
// =============================================================================

/// The event streams a map exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Move,
    MoveEnd,
    Click,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Move, EventKind::MoveEnd, EventKind::Click];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Move => EVENT_MOVE,
            EventKind::MoveEnd => EVENT_MOVEEND,
            EventKind::Click => EVENT_CLICK,
        }
    }

    fn index(&self) -> usize {
        match self {
            EventKind::Move => 0,
            EventKind::MoveEnd => 1,
            EventKind::Click => 2,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A click on the map surface.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// Innermost element under the pointer
    pub target: Element,
    /// Pointer position in viewport pixels
    pub point: Point,
}

#[derive(Debug, Clone)]
pub enum MapEvent {
    Move,
    MoveEnd,
    Click(ClickEvent),
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::Move => EventKind::Move,
            MapEvent::MoveEnd => EventKind::MoveEnd,
            MapEvent::Click(_) => EventKind::Click,
        }
    }
}

/// A map event callback. Identity is the `Rc` allocation.
pub type Listener = Rc<dyn Fn(&MapEvent)>;

pub(crate) fn same_listener(a: &Listener, b: &Listener) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

// =============================================================================
// EVENTED
// =============================================================================

/// Per-kind listener lists.
#[derive(Default)]
pub struct Evented {
    listeners: [RefCell<Vec<Listener>>; 3],
}

impl Evented {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`. Registering the same listener twice
    /// makes it fire twice.
    pub fn on(&self, kind: EventKind, listener: Listener) {
        self.listeners[kind.index()].borrow_mut().push(listener);
    }

    /// Remove the first registration of `listener` for `kind`.
    ///
    /// Returns false when the listener was not registered.
    pub fn off(&self, kind: EventKind, listener: &Listener) -> bool {
        let mut list = self.listeners[kind.index()].borrow_mut();
        match list.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every listener registered for its kind at the
    /// moment of the call.
    pub fn fire(&self, event: &MapEvent) {
        // Snapshot first; no borrow may be held while listeners run
        let snapshot: Vec<Listener> = self.listeners[event.kind().index()].borrow().clone();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners[kind.index()].borrow().len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let listener: Listener = Rc::new(move |_: &MapEvent| count_clone.set(count_clone.get() + 1));
        (count, listener)
    }

    #[test]
    fn kinds_map_to_names() {
        assert_eq!(EventKind::Move.as_str(), "move");
        assert_eq!(EventKind::MoveEnd.to_string(), "moveend");
        assert_eq!(MapEvent::Move.kind(), EventKind::Move);
    }

    #[test]
    fn fire_reaches_only_matching_kind() {
        let evented = Evented::new();
        let (moves, on_move) = counter();
        let (ends, on_end) = counter();
        evented.on(EventKind::Move, on_move);
        evented.on(EventKind::MoveEnd, on_end);

        evented.fire(&MapEvent::Move);
        evented.fire(&MapEvent::Move);
        evented.fire(&MapEvent::MoveEnd);

        assert_eq!(moves.get(), 2);
        assert_eq!(ends.get(), 1);
    }

    #[test]
    fn off_uses_identity() {
        let evented = Evented::new();
        let (count, listener) = counter();
        let (_, other) = counter();

        evented.on(EventKind::Move, listener.clone());
        assert!(!evented.off(EventKind::Move, &other));
        assert!(!evented.off(EventKind::MoveEnd, &listener));
        assert_eq!(evented.listener_count(EventKind::Move), 1);

        assert!(evented.off(EventKind::Move, &listener));
        assert!(!evented.off(EventKind::Move, &listener));

        evented.fire(&MapEvent::Move);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn off_removes_one_registration_at_a_time() {
        let evented = Evented::new();
        let (count, listener) = counter();
        evented.on(EventKind::Move, listener.clone());
        evented.on(EventKind::Move, listener.clone());

        evented.off(EventKind::Move, &listener);
        evented.fire(&MapEvent::Move);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_can_unsubscribe_itself_during_dispatch() {
        let evented = Rc::new(Evented::new());
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));

        let listener: Listener = {
            let evented = Rc::downgrade(&evented);
            let count = count.clone();
            let slot = slot.clone();
            Rc::new(move |_: &MapEvent| {
                count.set(count.get() + 1);
                let me = slot.borrow().clone();
                if let (Some(evented), Some(me)) = (evented.upgrade(), me) {
                    evented.off(EventKind::Move, &me);
                }
            })
        };
        *slot.borrow_mut() = Some(listener.clone());
        evented.on(EventKind::Move, listener);

        evented.fire(&MapEvent::Move);
        evented.fire(&MapEvent::Move);

        assert_eq!(count.get(), 1);
        assert_eq!(evented.listener_count(EventKind::Move), 0);
        slot.borrow_mut().take();
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_event() {
        let evented = Rc::new(Evented::new());
        let (late_count, late) = counter();

        let adder: Listener = {
            let evented = Rc::downgrade(&evented);
            Rc::new(move |_: &MapEvent| {
                if let Some(evented) = evented.upgrade() {
                    evented.on(EventKind::Click, late.clone());
                }
            })
        };
        evented.on(EventKind::Click, adder);

        let click = MapEvent::Click(ClickEvent {
            target: Element::default(),
            point: Point::ZERO,
        });
        evented.fire(&click);
        assert_eq!(late_count.get(), 0);

        evented.fire(&click);
        assert_eq!(late_count.get(), 1);
    }
}
