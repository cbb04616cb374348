use crate::event::EventData;
use offscreen_common::{Geometry, ProxyId, Surface};
use serde::{Deserialize, Serialize};

/// Every `type` the render side accepts.
pub const MESSAGE_TYPES: [&str; 5] = ["makeProxy", "start", "event", "size", "disposeProxy"];

/// Errors from encoding or decoding wire records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON record: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("record has no string `type` field")]
    MissingType,
    #[error("no handler for type: {0}")]
    UnknownMessageType(String),
    #[error("malformed `{kind}` record: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A record crossing the channel in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Create a receiver for `id` on the render side.
    MakeProxy { id: ProxyId },
    /// Hand the surface and the matching receiver to the scene.
    Start { id: ProxyId, surface: Surface },
    /// Dispatch `data` to receiver `id`.
    Event { id: ProxyId, data: EventData },
    /// Shorthand for an `event` carrying a size record.
    Size {
        id: ProxyId,
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    },
    /// Remove receiver `id`.
    DisposeProxy { id: ProxyId },
}

impl Message {
    pub fn size(id: ProxyId, g: Geometry) -> Self {
        Self::Size {
            id,
            left: g.left,
            top: g.top,
            width: g.width,
            height: g.height,
        }
    }

    pub fn id(&self) -> &ProxyId {
        match self {
            Self::MakeProxy { id }
            | Self::Start { id, .. }
            | Self::Event { id, .. }
            | Self::Size { id, .. }
            | Self::DisposeProxy { id } => id,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MakeProxy { .. } => "makeProxy",
            Self::Start { .. } => "start",
            Self::Event { .. } => "event",
            Self::Size { .. } => "size",
            Self::DisposeProxy { .. } => "disposeProxy",
        }
    }
}

/// Serialize a message into its JSON wire form.
pub fn encode(msg: &Message) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

/// Parse a JSON wire record.
///
/// The `type` is checked against [`MESSAGE_TYPES`] before the body is
/// decoded, so an unrecognized type is reported by name rather than as a
/// shape error.
pub fn decode(raw: &str) -> Result<Message, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ProtocolError::Syntax)?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_owned();
    if !MESSAGE_TYPES.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownMessageType(kind));
    }
    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
}
