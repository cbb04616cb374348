//! UI side of the bridge: the only code that touches host input APIs.
//!
//! # Invariants
//! - Records are posted in host event order.
//! - Touch events have their default prevented synchronously, inside the
//!   native handler, before the record is posted.
//! - After `dispose()` no native listener or layout observer remains attached.

pub mod host;
pub mod native;
pub mod proxy;
pub mod serialize;
pub mod transport;

pub use host::{HandlerId, HostElement, LayoutObserver, NativeHandler, SimulatedElement};
pub use native::{Modifiers, NativeEvent, PointerInfo, Position, WheelDelta};
pub use proxy::ElementProxy;
pub use serialize::serialize;
pub use transport::{ChannelTransport, Transport, TransportError};
