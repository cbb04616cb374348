//! Render side of the bridge: receivers that impersonate an input element,
//! and the manager that routes records to them by `ProxyId`.
//!
//! # Invariants
//! - At most one receiver per `ProxyId`.
//! - Geometry changes only through `size` records.
//! - Every listener registered for a kind at dispatch time runs exactly once,
//!   in registration order, whatever the other listeners do.
//! - Listener tables are touched only from the render thread.

pub mod document;
pub mod listeners;
pub mod manager;
pub mod receiver;

pub use document::{DocumentShim, Style, VisibilityState};
pub use listeners::{DispatchReport, Listener, ListenerOptions, ListenerTable, listener};
pub use manager::{BridgeError, Delivery, ProxyManager};
pub use receiver::ElementProxyReceiver;
