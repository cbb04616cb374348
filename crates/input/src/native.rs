use offscreen_protocol::{EventKind, Touch};
use serde::Deserialize;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Pointer position in client and page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Position {
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default)]
    pub page_x: Option<f64>,
    #[serde(default)]
    pub page_y: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointerInfo {
    pub pointer_id: i32,
    pub pointer_type: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WheelDelta {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub mode: u32,
}

/// An event as the host element delivers it.
///
/// Carries more than the wire format does: `extra` holds host-only
/// properties (targets, composed paths, ...) that never cross the channel.
#[derive(Debug, Clone, Deserialize)]
pub struct NativeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub time_stamp: Option<f64>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub modifiers: Option<Modifiers>,
    #[serde(default)]
    pub button: Option<i16>,
    #[serde(default)]
    pub buttons: Option<u16>,
    #[serde(default)]
    pub pointer: Option<PointerInfo>,
    #[serde(default)]
    pub wheel: Option<WheelDelta>,
    #[serde(default)]
    pub touches: Option<Vec<Touch>>,
    #[serde(default)]
    pub changed_touches: Option<Vec<Touch>>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
    #[serde(skip)]
    default_prevented: Cell<bool>,
}

impl NativeEvent {
    pub fn new(kind: EventKind, time_stamp: f64) -> Self {
        Self {
            time_stamp: Some(time_stamp),
            ..Self::untimed(kind)
        }
    }

    /// An event whose host supplied no timestamp.
    pub fn untimed(kind: EventKind) -> Self {
        Self {
            kind,
            time_stamp: None,
            position: None,
            modifiers: None,
            button: None,
            buttons: None,
            pointer: None,
            wheel: None,
            touches: None,
            changed_touches: None,
            key: None,
            code: None,
            extra: BTreeMap::new(),
            default_prevented: Cell::new(false),
        }
    }

    pub fn at(mut self, client_x: f64, client_y: f64) -> Self {
        self.position = Some(Position {
            client_x,
            client_y,
            page_x: None,
            page_y: None,
        });
        self
    }

    pub fn with_page(mut self, page_x: f64, page_y: f64) -> Self {
        let mut pos = self.position.unwrap_or_default();
        pos.page_x = Some(page_x);
        pos.page_y = Some(page_y);
        self.position = Some(pos);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn with_buttons(mut self, button: i16, buttons: u16) -> Self {
        self.button = Some(button);
        self.buttons = Some(buttons);
        self
    }

    pub fn with_pointer(mut self, pointer_id: i32, pointer_type: &str, is_primary: bool) -> Self {
        self.pointer = Some(PointerInfo {
            pointer_id,
            pointer_type: pointer_type.to_owned(),
            is_primary,
        });
        self
    }

    pub fn with_wheel(mut self, x: f64, y: f64, z: f64, mode: u32) -> Self {
        self.wheel = Some(WheelDelta { x, y, z, mode });
        self
    }

    pub fn with_touches(mut self, touches: Vec<Touch>, changed: Vec<Touch>) -> Self {
        self.touches = Some(touches);
        self.changed_touches = Some(changed);
        self
    }

    pub fn with_key(mut self, key: &str, code: &str) -> Self {
        self.key = Some(key.to_owned());
        self.code = Some(code.to_owned());
        self
    }

    pub fn with_extra(mut self, name: &str, value: &str) -> Self {
        self.extra.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_page_without_losing_client() {
        let e = NativeEvent::new(EventKind::MouseDown, 1.0)
            .at(3.0, 4.0)
            .with_page(30.0, 40.0);
        let pos = e.position.unwrap();
        assert_eq!(pos.client_x, 3.0);
        assert_eq!(pos.page_y, Some(40.0));
    }

    #[test]
    fn untimed_event_has_no_time_stamp() {
        assert_eq!(NativeEvent::untimed(EventKind::KeyUp).time_stamp, None);
        assert_eq!(NativeEvent::new(EventKind::KeyUp, 4.0).time_stamp, Some(4.0));
    }

    #[test]
    fn prevent_default_is_observable() {
        let e = NativeEvent::new(EventKind::TouchStart, 0.0);
        assert!(!e.default_prevented());
        e.prevent_default();
        assert!(e.default_prevented());
    }
}
