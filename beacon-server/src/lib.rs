pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod server;
pub mod signaling;
pub mod transport;

pub use config::*;
pub use error::*;
pub use registry::{PlayerRegistry, RegistryEvent, StreamerRegistry, sanitize_streamer_id};
pub use server::*;
pub use signaling::serve;
pub use transport::{InboundFrame, OutboundFrame, Protocol};
