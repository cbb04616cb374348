use crate::host::{HandlerId, HostElement, LayoutObserver, NativeHandler};
use crate::native::NativeEvent;
use crate::serialize::serialize;
use crate::transport::{Transport, TransportError};
use offscreen_common::{Geometry, ProxyId, Surface};
use offscreen_protocol::{EventKind, Message};
use std::cell::Cell;
use std::rc::Rc;

/// Mirrors a host element's geometry and input events to the render context.
///
/// Every record it posts is tagged with its `ProxyId`. The render side pairs
/// it with an `ElementProxyReceiver` of the same id.
pub struct ElementProxy {
    id: ProxyId,
    host: Rc<dyn HostElement>,
    transport: Rc<dyn Transport>,
    listeners: Vec<HandlerId>,
    observer: Option<HandlerId>,
    disposed: bool,
}

impl ElementProxy {
    /// Attach to `host`: announce the proxy, post its current geometry, then
    /// forward every curated event kind and every layout change.
    pub fn create(
        host: Rc<dyn HostElement>,
        transport: Rc<dyn Transport>,
        id: ProxyId,
    ) -> Result<Self, TransportError> {
        transport.post(&Message::MakeProxy { id: id.clone() })?;
        let initial = host.bounding_rect();
        if let Err(e) = transport.post(&Message::size(id.clone(), initial)) {
            // The receiver may already exist on the render side.
            if let Err(undo) = transport.post(&Message::DisposeProxy { id: id.clone() }) {
                tracing::debug!(proxy = %id, "dispose after failed attach not delivered: {undo}");
            }
            return Err(e);
        }

        let listeners = EventKind::ALL
            .iter()
            .map(|kind| host.add_listener(*kind, forward_events(&id, &transport)))
            .collect();
        let observer = host.observe_layout(forward_layout(&id, &transport, initial));

        tracing::debug!(proxy = %id, ?initial, "element proxy attached");
        Ok(Self {
            id,
            host,
            transport,
            listeners,
            observer: Some(observer),
            disposed: false,
        })
    }

    pub fn id(&self) -> &ProxyId {
        &self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Ask the render side to hand `surface` and this proxy's receiver to the scene.
    pub fn start(&self, surface: Surface) -> Result<(), TransportError> {
        self.transport.post(&Message::Start {
            id: self.id.clone(),
            surface,
        })
    }

    /// Detach from the host and tell the render side to drop the receiver.
    /// Later calls do nothing.
    pub fn dispose(&mut self) -> Result<(), TransportError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        for id in self.listeners.drain(..) {
            self.host.remove_listener(id);
        }
        if let Some(observer) = self.observer.take() {
            self.host.unobserve_layout(observer);
        }
        tracing::debug!(proxy = %self.id, "element proxy detached");
        self.transport
            .post(&Message::DisposeProxy { id: self.id.clone() })
    }
}

impl Drop for ElementProxy {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            tracing::debug!(proxy = %self.id, "dispose on drop: {e}");
        }
    }
}

fn forward_events(id: &ProxyId, transport: &Rc<dyn Transport>) -> NativeHandler {
    let id = id.clone();
    let transport = Rc::clone(transport);
    Rc::new(move |event: &NativeEvent| {
        // Must happen inside the native handler or the host ignores it.
        if event.kind.is_touch() {
            event.prevent_default();
        }
        let msg = Message::Event {
            id: id.clone(),
            data: serialize(event).into(),
        };
        if let Err(e) = transport.post(&msg) {
            tracing::warn!(proxy = %id, kind = %event.kind, "dropping event: {e}");
        }
    })
}

fn forward_layout(
    id: &ProxyId,
    transport: &Rc<dyn Transport>,
    initial: Geometry,
) -> LayoutObserver {
    let id = id.clone();
    let transport = Rc::clone(transport);
    let last = Cell::new(initial);
    Rc::new(move |geometry: Geometry| {
        if last.get() == geometry {
            return;
        }
        last.set(geometry);
        if let Err(e) = transport.post(&Message::size(id.clone(), geometry)) {
            tracing::warn!(proxy = %id, "dropping size update: {e}");
        }
    })
}
