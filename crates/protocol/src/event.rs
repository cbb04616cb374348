use offscreen_common::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The curated set of input event kinds that cross the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseLeave,
    MouseOut,
    Wheel,
    ContextMenu,
    KeyDown,
    KeyUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    PointerDown,
    PointerMove,
    PointerUp,
}

/// A named subset of event fields, copied as a unit by the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// `clientX`, `clientY`, `pageX`, `pageY`.
    Position,
    /// `shiftKey`, `ctrlKey`, `altKey`, `metaKey`.
    Modifiers,
    /// `button`, `buttons`.
    Buttons,
    /// `pointerId`, `pointerType`, `isPrimary`.
    Pointer,
    /// `deltaX`, `deltaY`, `deltaZ`, `deltaMode`.
    Wheel,
    /// `touches`, `changedTouches`.
    Touches,
    /// `key`, `code`.
    Keys,
}

const MOUSE_GROUPS: &[FieldGroup] = &[
    FieldGroup::Position,
    FieldGroup::Modifiers,
    FieldGroup::Buttons,
];
const POINTER_GROUPS: &[FieldGroup] = &[
    FieldGroup::Position,
    FieldGroup::Modifiers,
    FieldGroup::Buttons,
    FieldGroup::Pointer,
];
const WHEEL_GROUPS: &[FieldGroup] = &[
    FieldGroup::Position,
    FieldGroup::Modifiers,
    FieldGroup::Buttons,
    FieldGroup::Wheel,
];
const TOUCH_GROUPS: &[FieldGroup] = &[FieldGroup::Modifiers, FieldGroup::Touches];
const KEY_GROUPS: &[FieldGroup] = &[FieldGroup::Modifiers, FieldGroup::Keys];

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseMove,
        EventKind::MouseLeave,
        EventKind::MouseOut,
        EventKind::Wheel,
        EventKind::ContextMenu,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::TouchStart,
        EventKind::TouchMove,
        EventKind::TouchEnd,
        EventKind::TouchCancel,
        EventKind::PointerDown,
        EventKind::PointerMove,
        EventKind::PointerUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseLeave => "mouseleave",
            Self::MouseOut => "mouseout",
            Self::Wheel => "wheel",
            Self::ContextMenu => "contextmenu",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
        }
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel
        )
    }

    /// Field groups carried by records of this kind. `timeStamp` is always carried.
    pub fn field_groups(&self) -> &'static [FieldGroup] {
        match self {
            Self::MouseDown
            | Self::MouseUp
            | Self::MouseMove
            | Self::MouseLeave
            | Self::MouseOut
            | Self::ContextMenu => MOUSE_GROUPS,
            Self::PointerDown | Self::PointerMove | Self::PointerUp => POINTER_GROUPS,
            Self::Wheel => WHEEL_GROUPS,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel => {
                TOUCH_GROUPS
            }
            Self::KeyDown | Self::KeyUp => KEY_GROUPS,
        }
    }

    pub fn carries(&self, group: FieldGroup) -> bool {
        self.field_groups().contains(&group)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One touch point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Touch {
    pub identifier: i64,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_y: Option<f64>,
}

impl Touch {
    pub fn new(identifier: i64, client_x: f64, client_y: f64) -> Self {
        Self {
            identifier,
            client_x,
            client_y,
            page_x: None,
            page_y: None,
        }
    }
}

/// Transport-safe copy of an input event.
///
/// Every field except the kind is optional; a field the source event did not
/// carry stays `None` and is omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_key: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_mode: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touches: Option<Vec<Touch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_touches: Option<Vec<Touch>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<f64>,
}

impl EventRecord {
    /// An empty record of the given kind.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            client_x: None,
            client_y: None,
            page_x: None,
            page_y: None,
            shift_key: None,
            ctrl_key: None,
            alt_key: None,
            meta_key: None,
            button: None,
            buttons: None,
            pointer_id: None,
            pointer_type: None,
            is_primary: None,
            delta_x: None,
            delta_y: None,
            delta_z: None,
            delta_mode: None,
            touches: None,
            changed_touches: None,
            key: None,
            code: None,
            time_stamp: None,
        }
    }

    pub fn at(mut self, client_x: f64, client_y: f64) -> Self {
        self.client_x = Some(client_x);
        self.client_y = Some(client_y);
        self
    }

    /// Records are transport objects, not live events: nothing to prevent.
    pub fn prevent_default(&self) {}

    pub fn stop_propagation(&self) {}
}

/// `{type: "size"}` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeTag {
    #[serde(rename = "size")]
    Size,
}

/// A geometry update carried inside an `event` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRecord {
    #[serde(rename = "type")]
    pub tag: SizeTag,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl SizeRecord {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.left, self.top, self.width, self.height)
    }
}

impl From<Geometry> for SizeRecord {
    fn from(g: Geometry) -> Self {
        Self {
            tag: SizeTag::Size,
            left: g.left,
            top: g.top,
            width: g.width,
            height: g.height,
        }
    }
}

/// Payload of an `event` message: a geometry update or an input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    Size(SizeRecord),
    Input(EventRecord),
}

impl EventData {
    /// The wire `type` of the payload.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Size(_) => "size",
            Self::Input(record) => record.kind.as_str(),
        }
    }
}

impl From<EventRecord> for EventData {
    fn from(record: EventRecord) -> Self {
        Self::Input(record)
    }
}

impl From<Geometry> for EventData {
    fn from(g: Geometry) -> Self {
        Self::Size(g.into())
    }
}
