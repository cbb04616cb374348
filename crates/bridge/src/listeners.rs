use offscreen_protocol::{EventKind, EventRecord};
use std::collections::HashMap;
use std::rc::Rc;

/// A subscriber registered by a control library.
///
/// Returning `Err` is the listener's way of throwing; the dispatcher logs it
/// and carries on with the next listener.
pub type Listener = Rc<dyn Fn(&EventRecord) -> anyhow::Result<()>>;

pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&EventRecord) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Remove the listener after its first invocation.
    pub once: bool,
}

impl ListenerOptions {
    pub fn once() -> Self {
        Self { once: true }
    }
}

#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) listener: Listener,
    pub(crate) once: bool,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub invoked: usize,
    pub failed: usize,
}

/// Ordered listeners per event kind.
#[derive(Default)]
pub struct ListenerTable {
    by_kind: HashMap<EventKind, Vec<Registration>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` for `kind`. Returns false if the same listener is
    /// already registered for that kind.
    pub fn add(&mut self, kind: EventKind, listener: Listener, options: ListenerOptions) -> bool {
        let list = self.by_kind.entry(kind).or_default();
        if list.iter().any(|r| Rc::ptr_eq(&r.listener, &listener)) {
            return false;
        }
        list.push(Registration {
            listener,
            once: options.once,
        });
        true
    }

    /// Remove the first registration of `listener` for `kind`.
    pub fn remove(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let Some(list) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|r| Rc::ptr_eq(&r.listener, listener)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.by_kind.remove(&kind);
        }
        true
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Copy of the current registrations for `kind`, in order. Dispatch
    /// iterates the copy so listeners may mutate the table while running.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Registration> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }
}
