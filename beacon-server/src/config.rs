use beacon_core::{IceServerConfig, PeerConnectionOptions};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PROTOCOL_VERSION: &str = "1.2.0";
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Routing-layer settings shared by every connection.
#[derive(Debug, Clone)]
pub struct SignallingConfig {
    /// Sent to every peer in the `config` message.
    pub protocol_version: String,

    /// Sent verbatim to every peer in the `config` message.
    pub peer_connection_options: PeerConnectionOptions,

    /// How long a streamer may take to answer `identify`.
    pub identify_timeout: Duration,

    /// Substituted when a streamer claims an empty id.
    pub default_streamer_id: String,

    /// Prefix of ids handed to streamers that never identify.
    pub legacy_streamer_prefix: String,

    /// Id an SFU asks for on its streamer side.
    pub sfu_streamer_id: String,
}

impl Default for SignallingConfig {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_owned(),
            peer_connection_options: PeerConnectionOptions {
                ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_SERVER)],
                ..Default::default()
            },
            identify_timeout: Duration::from_secs(5),
            default_streamer_id: "UnknownStreamer".to_owned(),
            legacy_streamer_prefix: "__LEGACY_STREAMER__".to_owned(),
            sfu_streamer_id: "SFU".to_owned(),
        }
    }
}

/// Addresses of the three accept surfaces.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    pub streamer_addr: SocketAddr,
    pub player_addr: SocketAddr,
    pub sfu_addr: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            streamer_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
            player_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            sfu_addr: SocketAddr::from(([0, 0, 0, 0], 8889)),
        }
    }
}
