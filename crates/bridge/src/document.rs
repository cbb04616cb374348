use offscreen_common::ProxyId;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

/// The render context has no document. This record carries the few
/// document fields control libraries read, shared by every receiver.
#[derive(Debug, Default)]
pub struct DocumentShim {
    visibility: Cell<VisibilityState>,
}

impl DocumentShim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility_state(&self) -> VisibilityState {
        self.visibility.get()
    }

    pub fn set_visibility_state(&self, state: VisibilityState) {
        self.visibility.set(state);
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility.get() == VisibilityState::Hidden
    }

    /// Pointer lock can't cross contexts, so nothing ever holds it.
    pub fn pointer_lock_element(&self) -> Option<&ProxyId> {
        None
    }
}

/// Inline style bag. Writes are accepted and discarded.
#[derive(Debug, Default)]
pub struct Style;

impl Style {
    pub fn set(&self, property: &str, value: &str) {
        tracing::trace!(property, value, "style write ignored");
    }

    pub fn get(&self, _property: &str) -> Option<&str> {
        None
    }
}
