use beacon_core::SignalMessage;
use bytes::Bytes;

/// What the routing layer asks a transport task to do.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Message(SignalMessage),
    /// Close the socket; nothing queued after this is sent.
    Close { reason: String },
}

/// A raw frame as read off the socket.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Text(String),
    Binary(Bytes),
}
