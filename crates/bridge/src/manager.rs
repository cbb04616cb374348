use crate::document::DocumentShim;
use crate::listeners::DispatchReport;
use crate::receiver::ElementProxyReceiver;
use offscreen_common::ProxyId;
use offscreen_protocol::EventData;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

/// Errors from receiver bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("proxy {0} already exists")]
    DuplicateProxy(ProxyId),
    #[error("no proxy {0}")]
    UnknownProxy(ProxyId),
}

/// What became of a routed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered(DispatchReport),
    /// No receiver for the id; the record was discarded.
    Dropped,
}

/// Owns every receiver in the render context, keyed by `ProxyId`.
#[derive(Default)]
pub struct ProxyManager {
    targets: BTreeMap<ProxyId, Rc<ElementProxyReceiver>>,
    document: Rc<DocumentShim>,
    warned: HashSet<ProxyId>,
    dropped: u64,
}

impl ProxyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a receiver for `id`. Fails if one already exists;
    /// the existing receiver is left untouched.
    pub fn make_proxy(&mut self, id: ProxyId) -> Result<Rc<ElementProxyReceiver>, BridgeError> {
        if self.targets.contains_key(&id) {
            return Err(BridgeError::DuplicateProxy(id));
        }
        let receiver = Rc::new(ElementProxyReceiver::new(
            id.clone(),
            Rc::clone(&self.document),
        ));
        self.targets.insert(id.clone(), Rc::clone(&receiver));
        // A reused id gets a fresh warning if it goes stale again.
        self.warned.remove(&id);
        tracing::debug!(proxy = %id, "receiver created");
        Ok(receiver)
    }

    pub fn get_proxy(&self, id: &ProxyId) -> Result<Rc<ElementProxyReceiver>, BridgeError> {
        self.targets
            .get(id)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownProxy(id.clone()))
    }

    /// Route `data` to receiver `id`.
    ///
    /// Records for an unknown or disposed id are dropped; the first one per
    /// id is logged as a warning.
    pub fn handle_event(&mut self, id: &ProxyId, data: &EventData) -> Delivery {
        match self.targets.get(id) {
            Some(receiver) => Delivery::Delivered(receiver.handle_event(data)),
            None => {
                self.dropped += 1;
                if self.warned.insert(id.clone()) {
                    tracing::warn!(proxy = %id, kind = data.type_name(), "dropping record for unknown proxy");
                } else {
                    tracing::debug!(proxy = %id, kind = data.type_name(), "dropping record for unknown proxy");
                }
                Delivery::Dropped
            }
        }
    }

    /// Forget receiver `id`. Returns false if there was none.
    pub fn dispose_proxy(&mut self, id: &ProxyId) -> bool {
        let removed = self.targets.remove(id).is_some();
        if removed {
            tracing::debug!(proxy = %id, "receiver disposed");
        }
        removed
    }

    pub fn contains(&self, id: &ProxyId) -> bool {
        self.targets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ProxyId> {
        self.targets.keys()
    }

    /// Records discarded because no receiver matched.
    pub fn dropped_records(&self) -> u64 {
        self.dropped
    }

    pub fn document(&self) -> &DocumentShim {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::{ListenerOptions, listener};
    use offscreen_common::Geometry;
    use offscreen_protocol::{EventKind, EventRecord};
    use std::cell::Cell;

    #[test]
    fn make_and_get() {
        let mut m = ProxyManager::new();
        let r = m.make_proxy("A".into()).unwrap();
        let again = m.get_proxy(&"A".into()).unwrap();
        assert!(Rc::ptr_eq(&r, &again));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn duplicate_id_fails_and_keeps_original() {
        let mut m = ProxyManager::new();
        let first = m.make_proxy("A".into()).unwrap();
        let err = m.make_proxy("A".into()).unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateProxy(ref id) if id.as_str() == "A"));
        assert!(Rc::ptr_eq(&first, &m.get_proxy(&"A".into()).unwrap()));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn get_unknown_fails() {
        let m = ProxyManager::new();
        assert!(matches!(
            m.get_proxy(&"Z".into()),
            Err(BridgeError::UnknownProxy(_))
        ));
    }

    #[test]
    fn unknown_id_is_dropped_and_warned_once() {
        let mut m = ProxyManager::new();
        let mut wheel = EventRecord::new(EventKind::Wheel);
        wheel.delta_y = Some(1.0);
        let data = EventData::Input(wheel);

        assert_eq!(m.handle_event(&"Z".into(), &data), Delivery::Dropped);
        assert_eq!(m.handle_event(&"Z".into(), &data), Delivery::Dropped);
        assert_eq!(m.dropped_records(), 2);
        // Only the first drop for an id takes the warn! branch.
        assert!(m.warned.contains(&ProxyId::new("Z")));
        assert_eq!(m.warned.len(), 1);

        m.make_proxy("Z".into()).unwrap();
        assert!(m.warned.is_empty());
    }

    #[test]
    fn records_route_by_id() {
        let mut m = ProxyManager::new();
        let a = m.make_proxy("A".into()).unwrap();
        let b = m.make_proxy("B".into()).unwrap();
        m.handle_event(&"B".into(), &Geometry::new(0, 0, 64, 32).into());
        assert_eq!(a.client_width(), 0);
        assert_eq!(b.client_width(), 64);
    }

    #[test]
    fn disposed_proxy_drops_in_flight_records() {
        let mut m = ProxyManager::new();
        let r = m.make_proxy("A".into()).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        r.add_event_listener(
            EventKind::MouseMove,
            listener(move |_| {
                h.set(h.get() + 1);
                Ok(())
            }),
            ListenerOptions::default(),
        );

        assert!(m.dispose_proxy(&"A".into()));
        assert!(!m.dispose_proxy(&"A".into()));
        let d = m.handle_event(&"A".into(), &EventRecord::new(EventKind::MouseMove).into());
        assert_eq!(d, Delivery::Dropped);
        assert_eq!(hits.get(), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn receivers_share_one_document() {
        let mut m = ProxyManager::new();
        let a = m.make_proxy("A".into()).unwrap();
        let b = m.make_proxy("B".into()).unwrap();
        m.document()
            .set_visibility_state(crate::document::VisibilityState::Hidden);
        assert!(a.document().is_hidden());
        assert!(b.document().is_hidden());
    }
}
