use crate::model::routed::RoutedPayload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// `RTCConfiguration` handed to every peer in the `config` message.
///
/// Anything beyond the ICE server list is passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConnectionOptions {
    #[serde(default)]
    pub ice_servers: Vec<IceServerConfig>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One frame of the signalling protocol, discriminated by `type`.
///
/// A `type` outside this catalog fails to decode, which the protocol layer
/// treats as "no listener" and drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    Identify,
    EndpointId {
        #[serde(default)]
        id: String,
    },
    EndpointIdConfirm {
        committed_id: String,
    },
    Config {
        peer_connection_options: PeerConnectionOptions,
        protocol_version: String,
    },
    Ping {
        time: Number,
    },
    Pong {
        time: Number,
    },
    ListStreamers,
    StreamerList {
        ids: Vec<String>,
    },
    Subscribe {
        streamer_id: String,
    },
    SubscribeFailed {
        message: String,
    },
    Unsubscribe,
    PlayerConnected {
        player_id: String,
        data_channel: bool,
        sfu: bool,
        send_offer: bool,
    },
    PlayerDisconnected {
        player_id: String,
    },
    StreamerIdChanged {
        #[serde(rename = "newID")]
        new_id: String,
    },
    StreamerDisconnected,
    DisconnectPlayer {
        player_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Offer(RoutedPayload),
    Answer(RoutedPayload),
    IceCandidate(RoutedPayload),
    LayerPreference(RoutedPayload),
    DataChannelRequest(RoutedPayload),
    PeerDataChannelsReady(RoutedPayload),
    StreamerDataChannels(RoutedPayload),
    PeerDataChannels(RoutedPayload),
    StartStreaming,
    StopStreaming,
}

impl SignalMessage {
    /// Wire name of the message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Identify => "identify",
            SignalMessage::EndpointId { .. } => "endpointId",
            SignalMessage::EndpointIdConfirm { .. } => "endpointIdConfirm",
            SignalMessage::Config { .. } => "config",
            SignalMessage::Ping { .. } => "ping",
            SignalMessage::Pong { .. } => "pong",
            SignalMessage::ListStreamers => "listStreamers",
            SignalMessage::StreamerList { .. } => "streamerList",
            SignalMessage::Subscribe { .. } => "subscribe",
            SignalMessage::SubscribeFailed { .. } => "subscribeFailed",
            SignalMessage::Unsubscribe => "unsubscribe",
            SignalMessage::PlayerConnected { .. } => "playerConnected",
            SignalMessage::PlayerDisconnected { .. } => "playerDisconnected",
            SignalMessage::StreamerIdChanged { .. } => "streamerIdChanged",
            SignalMessage::StreamerDisconnected => "streamerDisconnected",
            SignalMessage::DisconnectPlayer { .. } => "disconnectPlayer",
            SignalMessage::Offer(_) => "offer",
            SignalMessage::Answer(_) => "answer",
            SignalMessage::IceCandidate(_) => "iceCandidate",
            SignalMessage::LayerPreference(_) => "layerPreference",
            SignalMessage::DataChannelRequest(_) => "dataChannelRequest",
            SignalMessage::PeerDataChannelsReady(_) => "peerDataChannelsReady",
            SignalMessage::StreamerDataChannels(_) => "streamerDataChannels",
            SignalMessage::PeerDataChannels(_) => "peerDataChannels",
            SignalMessage::StartStreaming => "startStreaming",
            SignalMessage::StopStreaming => "stopStreaming",
        }
    }

    /// The relay payload carried by negotiation messages, if any.
    pub fn payload(&self) -> Option<&RoutedPayload> {
        match self {
            SignalMessage::Offer(p)
            | SignalMessage::Answer(p)
            | SignalMessage::IceCandidate(p)
            | SignalMessage::LayerPreference(p)
            | SignalMessage::DataChannelRequest(p)
            | SignalMessage::PeerDataChannelsReady(p)
            | SignalMessage::StreamerDataChannels(p)
            | SignalMessage::PeerDataChannels(p) => Some(p),
            _ => None,
        }
    }

    pub fn payload_mut(&mut self) -> Option<&mut RoutedPayload> {
        match self {
            SignalMessage::Offer(p)
            | SignalMessage::Answer(p)
            | SignalMessage::IceCandidate(p)
            | SignalMessage::LayerPreference(p)
            | SignalMessage::DataChannelRequest(p)
            | SignalMessage::PeerDataChannelsReady(p)
            | SignalMessage::StreamerDataChannels(p)
            | SignalMessage::PeerDataChannels(p) => Some(p),
            _ => None,
        }
    }
}
