use crate::connection::{
    PlayerConnection, PlayerFacet, Session, SessionHub, SessionRole, StreamerFacet,
};
use crate::transport::Protocol;
use beacon_core::{ConnectionId, SignalMessage};
use tracing::{debug, error, info, warn};

/// Handler for a selective forwarding unit.
///
/// One session, two facets: players see it as a streamer, its upstream
/// streamer sees it as a player. Viewer-side behaviour is delegated to
/// [`PlayerConnection`].
pub(crate) struct SfuConnection<'a> {
    hub: &'a mut SessionHub,
    connection: ConnectionId,
}

impl<'a> SfuConnection<'a> {
    pub(crate) fn new(hub: &'a mut SessionHub, connection: ConnectionId) -> Self {
        Self { hub, connection }
    }

    /// Admit an SFU into both registries. It starts out not streaming.
    pub(crate) fn open(hub: &'a mut SessionHub, protocol: Protocol) {
        let connection = protocol.connection();
        let desired = hub.config.sfu_streamer_id.clone();

        let streamer_id = match hub.streamers.add(&desired, connection, false) {
            Ok(id) => id,
            Err(e) => {
                error!("Refusing SFU {}: {}", connection, e);
                protocol.disconnect("SFU id already in use");
                return;
            }
        };
        let player_id = hub.players.add(connection);
        info!(
            "SFU connected: {} as streamer '{}' / player '{}'",
            connection, streamer_id, player_id
        );

        hub.sessions.insert(
            connection,
            Session {
                protocol,
                role: SessionRole::Sfu {
                    streamer: StreamerFacet {
                        streamer_id: Some(streamer_id),
                        ..Default::default()
                    },
                    player: PlayerFacet {
                        player_id,
                        subscribed: None,
                        send_offer: true,
                    },
                },
            },
        );
        hub.send_config(connection);
        hub.send(connection, SignalMessage::Identify);
    }

    pub(crate) fn on_message(self, msg: SignalMessage) {
        match msg {
            SignalMessage::EndpointId { id } => self.on_endpoint_id(&id),
            SignalMessage::StartStreaming => self.set_streaming(true),
            SignalMessage::StopStreaming => self.set_streaming(false),
            SignalMessage::Subscribe { .. }
            | SignalMessage::Unsubscribe
            | SignalMessage::ListStreamers
            | SignalMessage::Answer(_)
            | SignalMessage::DataChannelRequest(_)
            | SignalMessage::PeerDataChannelsReady(_) => self.as_player().on_message(msg),
            // The SFU originates offers toward its own players.
            SignalMessage::Offer(_) | SignalMessage::PeerDataChannels(_) => {
                self.hub.send_to_player(self.connection, msg)
            }
            SignalMessage::IceCandidate(_) => self.on_ice_candidate(msg),
            SignalMessage::StreamerDataChannels(_) => self.on_streamer_data_channels(msg),
            SignalMessage::DisconnectPlayer { player_id, reason } => {
                self.on_disconnect_player(&player_id, reason.as_deref())
            }
            other => debug!("SFU {} sent unhandled '{}'", self.connection, other.kind()),
        }
    }

    /// The upstream streamer is gone: stop streaming and remove the SFU.
    pub(crate) fn on_upstream_disconnected(mut self, streamer_id: &str) {
        let Some(session) = self.hub.sessions.get_mut(&self.connection) else {
            return;
        };
        if let Some(player) = session.player_mut() {
            if player.subscribed.as_deref() != Some(streamer_id) {
                return;
            }
            player.subscribed = None;
        }

        warn!(
            "SFU {} lost upstream streamer '{}'",
            self.connection, streamer_id
        );
        self.set_streaming_flag(false);
        self.hub
            .terminate(self.connection, "Upstream streamer disconnected");
    }

    /// Leave both registries; its own players are told the streamer is gone.
    pub(crate) fn on_close(self) {
        PlayerConnection::new(&mut *self.hub, self.connection).unsubscribe();

        let Some(session) = self.hub.sessions.remove(&self.connection) else {
            return;
        };
        info!("SFU disconnected: {}", self.connection);

        let SessionRole::Sfu { streamer, player } = session.role else {
            return;
        };
        if let Some(streamer_id) = streamer.streamer_id {
            self.hub.retire_streamer(&streamer_id, streamer.subscribers);
        }
        self.hub.players.remove(&player.player_id);
    }

    /// Stamped candidates belong to a downstream player, unstamped ones to
    /// the upstream streamer.
    fn on_ice_candidate(self, msg: SignalMessage) {
        let downstream = msg.payload().is_some_and(|p| p.player_id.is_some());
        if downstream {
            self.hub.send_to_player(self.connection, msg);
        } else {
            self.as_player().send_to_streamer(msg);
        }
    }

    fn on_endpoint_id(mut self, claimed: &str) {
        let connection = self.connection;
        let Some(facet) = self.streamer_facet_mut() else {
            return;
        };
        if facet.identified {
            debug!("SFU {} repeated endpointId '{}'", connection, claimed);
            return;
        }
        facet.identified = true;
        info!(
            "SFU {} identified as '{}', keeping '{}'",
            connection,
            claimed,
            facet.streamer_id.as_deref().unwrap_or_default()
        );
    }

    fn set_streaming(mut self, streaming: bool) {
        self.set_streaming_flag(streaming);
    }

    fn set_streaming_flag(&mut self, streaming: bool) {
        let Some(streamer_id) = self
            .streamer_facet_mut()
            .and_then(|facet| facet.streamer_id.clone())
        else {
            return;
        };
        if self.hub.streamers.set_streaming(&streamer_id, streaming) {
            debug!("SFU '{}' streaming: {}", streamer_id, streaming);
        }
    }

    /// Channel setup relayed upstream carries the SFU's player id as `sfuId`
    /// so the streamer can tell it apart from a direct player.
    fn on_streamer_data_channels(self, mut msg: SignalMessage) {
        let Some(sfu_id) = self
            .hub
            .sessions
            .get(&self.connection)
            .and_then(Session::player)
            .map(|facet| facet.player_id.clone())
        else {
            return;
        };
        let Some(payload) = msg.payload_mut() else {
            return;
        };
        payload.insert("sfuId", sfu_id.clone());

        let Some(target) = self
            .hub
            .sessions
            .get(&self.connection)
            .and_then(Session::player)
            .and_then(|facet| facet.subscribed.as_deref())
            .and_then(|id| self.hub.streamers.find(id))
            .map(|record| record.connection)
        else {
            warn!(
                "SFU {} sent streamerDataChannels without an upstream streamer",
                self.connection
            );
            return;
        };

        if payload.player_id.is_none() {
            payload.player_id = Some(sfu_id);
        }
        self.hub.send(target, msg);
    }

    fn on_disconnect_player(self, player_id: &str, reason: Option<&str>) {
        let Some(target) = self.hub.players.get(player_id) else {
            warn!(
                "SFU {} asked to disconnect missing player '{}'",
                self.connection, player_id
            );
            return;
        };

        self.hub
            .terminate(target, reason.unwrap_or("Disconnected by SFU"));
    }

    fn as_player(self) -> PlayerConnection<'a> {
        PlayerConnection::new(self.hub, self.connection)
    }

    fn streamer_facet_mut(&mut self) -> Option<&mut StreamerFacet> {
        self.hub
            .sessions
            .get_mut(&self.connection)
            .and_then(Session::streamer_mut)
    }
}
