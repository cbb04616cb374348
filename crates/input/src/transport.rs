use offscreen_protocol::{Message, ProtocolError, encode};
use std::sync::mpsc;

/// Errors from posting a record to the render context.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("render context is gone")]
    Disconnected,
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Ordered, asynchronous, one-way message channel to the render context.
pub trait Transport {
    fn post(&self, msg: &Message) -> Result<(), TransportError>;
}

/// Posts JSON frames over an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// A transport and the receiving end the render context drains.
    pub fn pair() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn post(&self, msg: &Message) -> Result<(), TransportError> {
        let frame = encode(msg)?;
        tracing::trace!(kind = msg.type_name(), proxy = %msg.id(), "post");
        self.tx.send(frame).map_err(|_| TransportError::Disconnected)
    }
}
