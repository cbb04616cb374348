//! Shared types for both sides of the offscreen input bridge.
//!
//! # Invariants
//! - A `ProxyId` names exactly one (UI element, receiver) pair.
//! - Geometry width and height are never negative.

mod types;

pub use types::{BoundingRect, Geometry, ProxyId, Surface};
