use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of one logical input surface.
///
/// Stable for the lifetime of the paired proxy and receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyId(pub String);

impl ProxyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id, for hosts that don't name their surfaces.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProxyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Bounding rectangle of an input element in device-independent units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// The DOM-shaped rect derived from this geometry.
    pub fn bounding_rect(&self) -> BoundingRect {
        BoundingRect {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            right: self.right(),
            bottom: self.bottom(),
        }
    }
}

/// What `getBoundingClientRect()` answers on the render side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub right: i64,
    pub bottom: i64,
}

/// Descriptor of a drawing surface that has already been handed to the
/// render context. The render side owns it exclusively once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

impl Default for Surface {
    // Same default size as an unstyled canvas element.
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
        }
    }
}

impl Surface {
    /// Resize the backing store; returns true if the size changed.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}
