use crate::native::NativeEvent;
use offscreen_common::Geometry;
use offscreen_protocol::EventKind;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type NativeHandler = Rc<dyn Fn(&NativeEvent)>;
pub type LayoutObserver = Rc<dyn Fn(Geometry)>;

/// Handle returned by listener and observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// The host-side input element an `ElementProxy` attaches to.
pub trait HostElement {
    /// Current bounding rectangle.
    fn bounding_rect(&self) -> Geometry;

    fn add_listener(&self, kind: EventKind, handler: NativeHandler) -> HandlerId;

    /// Returns false if `id` was not registered.
    fn remove_listener(&self, id: HandlerId) -> bool;

    /// Called with the new rect on every resize or move.
    fn observe_layout(&self, observer: LayoutObserver) -> HandlerId;

    fn unobserve_layout(&self, id: HandlerId) -> bool;
}

/// In-memory host element that fires events synchronously.
///
/// Stands in for a real page element in the CLI and in tests.
#[derive(Default)]
pub struct SimulatedElement {
    geometry: Cell<Geometry>,
    listeners: RefCell<Vec<(HandlerId, EventKind, NativeHandler)>>,
    observers: RefCell<Vec<(HandlerId, LayoutObserver)>>,
    next_id: Cell<u64>,
}

impl SimulatedElement {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Cell::new(geometry),
            ..Default::default()
        }
    }

    /// Deliver `event` to every listener for its kind, in registration order.
    /// Returns whether any handler prevented the default action.
    pub fn fire(&self, event: &NativeEvent) -> bool {
        let handlers: Vec<NativeHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
        event.default_prevented()
    }

    pub fn resize(&self, width: u32, height: u32) {
        let g = self.geometry.get();
        self.set_geometry(Geometry::new(g.left, g.top, width, height));
    }

    pub fn move_to(&self, left: i32, top: i32) {
        let g = self.geometry.get();
        self.set_geometry(Geometry::new(left, top, g.width, g.height));
    }

    pub fn set_geometry(&self, geometry: Geometry) {
        self.geometry.set(geometry);
        let observers: Vec<LayoutObserver> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer(geometry);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn next_handle(&self) -> HandlerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        HandlerId(id)
    }
}

impl HostElement for SimulatedElement {
    fn bounding_rect(&self) -> Geometry {
        self.geometry.get()
    }

    fn add_listener(&self, kind: EventKind, handler: NativeHandler) -> HandlerId {
        let id = self.next_handle();
        self.listeners.borrow_mut().push((id, kind, handler));
        id
    }

    fn remove_listener(&self, id: HandlerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(h, _, _)| *h != id);
        listeners.len() != before
    }

    fn observe_layout(&self, observer: LayoutObserver) -> HandlerId {
        let id = self.next_handle();
        self.observers.borrow_mut().push((id, observer));
        id
    }

    fn unobserve_layout(&self, id: HandlerId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(h, _)| *h != id);
        observers.len() != before
    }
}
