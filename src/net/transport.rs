//! Outbound message delivery
//!
//! Sending never blocks the tick. Frames go onto an unbounded queue, so a
//! send only fails once the receiving side is gone.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::protocol::{encode_frame, ClientMsg, Frame, ProtocolError, Reliability};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Outbound channel closed")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Delivery primitives provided by the network layer
pub trait Transport {
    fn send_reliable(&mut self, msg: ClientMsg);
    fn send_unreliable_sequenced(&mut self, msg: ClientMsg);

    /// Send with the delivery class the message calls for
    fn send(&mut self, msg: ClientMsg) {
        match msg.reliability() {
            Reliability::ReliableOrdered => self.send_reliable(msg),
            Reliability::UnreliableSequenced => self.send_unreliable_sequenced(msg),
        }
    }
}

/// Transport that queues JSON frames on a tokio channel
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    fn try_send(&self, reliability: Reliability, msg: ClientMsg) -> Result<(), TransportError> {
        let frame = encode_frame(&Frame { reliability, msg })?;
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

impl Transport for ChannelTransport {
    fn send_reliable(&mut self, msg: ClientMsg) {
        if let Err(e) = self.try_send(Reliability::ReliableOrdered, msg) {
            warn!(error = %e, "Failed to queue reliable message");
        }
    }

    fn send_unreliable_sequenced(&mut self, msg: ClientMsg) {
        if let Err(e) = self.try_send(Reliability::UnreliableSequenced, msg) {
            debug!(error = %e, "Dropped unreliable message");
        }
    }
}

/// Transport that keeps everything it is given, for inspection
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<(ClientMsg, Reliability)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &ClientMsg> {
        self.sent.iter().map(|(msg, _)| msg)
    }

    /// Take everything sent so far
    pub fn drain(&mut self) -> Vec<(ClientMsg, Reliability)> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    fn send_reliable(&mut self, msg: ClientMsg) {
        self.sent.push((msg, Reliability::ReliableOrdered));
    }

    fn send_unreliable_sequenced(&mut self, msg: ClientMsg) {
        self.sent.push((msg, Reliability::UnreliableSequenced));
    }
}
