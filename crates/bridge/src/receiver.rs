use crate::document::{DocumentShim, Style};
use crate::listeners::{DispatchReport, Listener, ListenerOptions, ListenerTable};
use offscreen_common::{BoundingRect, Geometry, ProxyId};
use offscreen_protocol::{EventData, EventKind, EventRecord};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

/// Element facade on the render side.
///
/// Answers geometry queries from a local cache so a control library can ask
/// every frame without a round trip, and re-emits received records to the
/// listeners that library registered.
pub struct ElementProxyReceiver {
    id: ProxyId,
    geometry: Cell<Geometry>,
    listeners: RefCell<ListenerTable>,
    style: Style,
    document: Rc<DocumentShim>,
}

impl fmt::Debug for ElementProxyReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementProxyReceiver")
            .field("id", &self.id)
            .field("geometry", &self.geometry.get())
            .finish_non_exhaustive()
    }
}

impl ElementProxyReceiver {
    pub fn new(id: ProxyId, document: Rc<DocumentShim>) -> Self {
        Self {
            id,
            geometry: Cell::new(Geometry::default()),
            listeners: RefCell::new(ListenerTable::new()),
            style: Style,
            document,
        }
    }

    pub fn id(&self) -> &ProxyId {
        &self.id
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry.get()
    }

    pub fn client_width(&self) -> u32 {
        self.geometry.get().width
    }

    pub fn client_height(&self) -> u32 {
        self.geometry.get().height
    }

    pub fn get_bounding_client_rect(&self) -> BoundingRect {
        self.geometry.get().bounding_rect()
    }

    /// Returns false if `listener` was already registered for `kind`.
    pub fn add_event_listener(
        &self,
        kind: EventKind,
        listener: Listener,
        options: ListenerOptions,
    ) -> bool {
        self.listeners.borrow_mut().add(kind, listener, options)
    }

    pub fn remove_event_listener(&self, kind: EventKind, listener: &Listener) -> bool {
        self.listeners.borrow_mut().remove(kind, listener)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.borrow().count(kind)
    }

    /// Invoke every listener registered for `record.kind` when the call
    /// starts, in registration order.
    ///
    /// A listener that errors or panics is logged and counted; the rest
    /// still run and nothing is raised to the caller.
    pub fn dispatch_event(&self, record: &EventRecord) -> DispatchReport {
        let registrations = self.listeners.borrow().snapshot(record.kind);
        let mut report = DispatchReport::default();

        for reg in registrations {
            if reg.once {
                self.listeners
                    .borrow_mut()
                    .remove(record.kind, &reg.listener);
            }
            report.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| (reg.listener)(record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::error!(proxy = %self.id, kind = %record.kind, "listener failed: {e:#}");
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::error!(proxy = %self.id, kind = %record.kind, "listener panicked");
                }
            }
        }
        report
    }

    /// Apply one inbound record: size records replace the cached geometry,
    /// input records go to listeners.
    pub fn handle_event(&self, data: &EventData) -> DispatchReport {
        match data {
            EventData::Size(size) => {
                self.geometry.set(size.geometry());
                tracing::debug!(proxy = %self.id, geometry = ?size.geometry(), "resized");
                DispatchReport::default()
            }
            EventData::Input(record) => self.dispatch_event(record),
        }
    }

    /// Capture can't cross contexts; the UI side keeps routing motion.
    pub fn set_pointer_capture(&self, _pointer_id: i32) {}

    pub fn release_pointer_capture(&self, _pointer_id: i32) {}

    pub fn focus(&self) {}

    pub fn blur(&self) {}

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Control libraries walk `ownerDocument` for extra subscriptions; the
    /// receiver stands in for it.
    pub fn owner_document(&self) -> &Self {
        self
    }

    pub fn get_root_node(&self) -> &Self {
        self
    }

    pub fn document(&self) -> &DocumentShim {
        &self.document
    }
}
