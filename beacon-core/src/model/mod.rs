mod connection;
mod routed;
mod signaling;

pub use connection::{ConnectionId, Role};
pub use routed::RoutedPayload;
pub use signaling::{IceServerConfig, PeerConnectionOptions, SignalMessage};
