//! Messages and delivery primitives shared with the session authority

pub mod protocol;
pub mod transport;

pub use protocol::{ClientMsg, Reliability, ServerMsg};
pub use transport::{ChannelTransport, RecordingTransport, Transport};
