//! Message protocol between the UI context and the render context.
//!
//! # Invariants
//! - The wire format is defined, not reflected: only whitelisted fields cross.
//! - A field absent on the source event is absent on the record.
//! - Unknown message types are rejected by the decoder, and nowhere else.

pub mod event;
pub mod message;

pub use event::{EventData, EventKind, EventRecord, FieldGroup, SizeRecord, Touch};
pub use message::{Message, ProtocolError, MESSAGE_TYPES, decode, encode};
