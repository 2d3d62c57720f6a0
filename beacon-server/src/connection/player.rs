use crate::connection::{PlayerFacet, Session, SessionHub, SessionRole};
use crate::server::ConnectOptions;
use crate::transport::Protocol;
use beacon_core::{ConnectionId, SignalMessage};
use tracing::{debug, error, info, warn};

/// Handler for the viewer side of a session.
///
/// SFU sessions reuse it for their upstream subscription, so everything here
/// goes through the player facet rather than assuming a plain player.
pub(crate) struct PlayerConnection<'a> {
    hub: &'a mut SessionHub,
    connection: ConnectionId,
}

impl<'a> PlayerConnection<'a> {
    pub(crate) fn new(hub: &'a mut SessionHub, connection: ConnectionId) -> Self {
        Self { hub, connection }
    }

    pub(crate) fn open(hub: &'a mut SessionHub, protocol: Protocol, options: ConnectOptions) {
        let connection = protocol.connection();
        let player_id = hub.players.add(connection);
        info!("Player '{}' connected: {}", player_id, connection);

        hub.sessions.insert(
            connection,
            Session {
                protocol,
                role: SessionRole::Player(PlayerFacet {
                    player_id,
                    subscribed: None,
                    send_offer: !options.offer_to_receive,
                }),
            },
        );
        hub.send_config(connection);
    }

    pub(crate) fn on_message(self, msg: SignalMessage) {
        match msg {
            SignalMessage::Subscribe { streamer_id } => self.subscribe(&streamer_id),
            SignalMessage::Unsubscribe => self.unsubscribe(),
            SignalMessage::ListStreamers => self.list_streamers(),
            SignalMessage::Offer(_)
            | SignalMessage::Answer(_)
            | SignalMessage::IceCandidate(_)
            | SignalMessage::DataChannelRequest(_)
            | SignalMessage::PeerDataChannelsReady(_) => self.send_to_streamer(msg),
            other => debug!(
                "Player {} sent unhandled '{}'",
                self.connection,
                other.kind()
            ),
        }
    }

    pub(crate) fn on_close(mut self) {
        let player_id = self.facet().map(|facet| facet.player_id.clone());
        self.unsubscribe_inner();

        self.hub.sessions.remove(&self.connection);
        if let Some(player_id) = player_id {
            info!("Player '{}' disconnected", player_id);
            self.hub.players.remove(&player_id);
        }
    }

    pub(crate) fn subscribe(mut self, streamer_id: &str) {
        let Some(record) = self.hub.streamers.find(streamer_id) else {
            warn!(
                "{} tried to subscribe to missing streamer '{}'",
                self.connection, streamer_id
            );
            self.hub.send(
                self.connection,
                SignalMessage::SubscribeFailed {
                    message: format!("Streamer '{streamer_id}' does not exist"),
                },
            );
            return;
        };

        if record.connection == self.connection {
            warn!("{} tried to subscribe to itself", self.connection);
            return;
        }

        let Some(current) = self.facet().map(|facet| facet.subscribed.clone()) else {
            return;
        };
        if let Some(current) = current {
            warn!(
                "{} subscribing to '{}' while still subscribed to '{}'",
                self.connection, streamer_id, current
            );
            self.unsubscribe_inner();
        }

        let sfu = self.is_sfu();
        let Some(facet) = self.facet_mut() else {
            return;
        };
        facet.subscribed = Some(streamer_id.to_owned());
        let notice = SignalMessage::PlayerConnected {
            player_id: facet.player_id.clone(),
            data_channel: true,
            sfu,
            send_offer: facet.send_offer,
        };

        if let Some(streamer) = self
            .hub
            .sessions
            .get_mut(&record.connection)
            .and_then(Session::streamer_mut)
        {
            streamer.attach(self.connection);
        }

        info!("{} subscribed to '{}'", self.connection, streamer_id);
        self.hub.send(record.connection, notice);
    }

    pub(crate) fn unsubscribe(mut self) {
        self.unsubscribe_inner();
    }

    /// Forward a negotiation message to the subscribed streamer, stamped with
    /// this player's id.
    ///
    /// An unsubscribed player falls back to the first registered streamer;
    /// with no streamers at all the session is terminated.
    pub(crate) fn send_to_streamer(mut self, mut msg: SignalMessage) {
        if self.subscribed_connection().is_none() {
            let Some(first) = self.hub.streamers.first_streamer_id() else {
                error!(
                    "{} sent '{}' with no streamers available",
                    self.connection,
                    msg.kind()
                );
                self.hub.terminate(self.connection, "No streamers available");
                return;
            };

            warn!(
                "{} sent '{}' before subscribing, falling back to '{}'",
                self.connection,
                msg.kind(),
                first
            );
            PlayerConnection::new(&mut *self.hub, self.connection).subscribe(&first);
        }

        let Some(target) = self.subscribed_connection() else {
            error!(
                "{} has no streamer to receive '{}'",
                self.connection,
                msg.kind()
            );
            return;
        };
        let Some(player_id) = self.facet().map(|facet| facet.player_id.clone()) else {
            return;
        };

        if let Some(payload) = msg.payload_mut() {
            payload.player_id = Some(player_id);
        }
        self.hub.send(target, msg);
    }

    /// The subscribed streamer went away; drop the subscription locally.
    pub(crate) fn on_streamer_disconnected(mut self, streamer_id: &str) {
        let Some(facet) = self.facet_mut() else {
            return;
        };
        if facet.subscribed.as_deref() != Some(streamer_id) {
            return;
        }
        facet.subscribed = None;

        info!(
            "{} lost streamer '{}', unsubscribed",
            self.connection, streamer_id
        );
        self.hub
            .send(self.connection, SignalMessage::StreamerDisconnected);
    }

    fn list_streamers(self) {
        let ids = self.hub.streamers.all_ids();
        self.hub
            .send(self.connection, SignalMessage::StreamerList { ids });
    }

    fn unsubscribe_inner(&mut self) {
        let Some(facet) = self.facet_mut() else {
            return;
        };
        let Some(streamer_id) = facet.subscribed.take() else {
            return;
        };
        let player_id = facet.player_id.clone();

        // Gone already when the streamer itself is being torn down.
        let Some(record) = self.hub.streamers.find(&streamer_id) else {
            return;
        };
        if let Some(streamer) = self
            .hub
            .sessions
            .get_mut(&record.connection)
            .and_then(Session::streamer_mut)
        {
            streamer.detach(self.connection);
        }

        info!("{} unsubscribed from '{}'", self.connection, streamer_id);
        self.hub
            .send(record.connection, SignalMessage::PlayerDisconnected { player_id });
    }

    fn subscribed_connection(&self) -> Option<ConnectionId> {
        let streamer_id = self.facet()?.subscribed.as_deref()?;
        Some(self.hub.streamers.find(streamer_id)?.connection)
    }

    fn is_sfu(&self) -> bool {
        self.hub
            .sessions
            .get(&self.connection)
            .is_some_and(|s| matches!(s.role, SessionRole::Sfu { .. }))
    }

    fn facet(&self) -> Option<&PlayerFacet> {
        self.hub
            .sessions
            .get(&self.connection)
            .and_then(Session::player)
    }

    fn facet_mut(&mut self) -> Option<&mut PlayerFacet> {
        self.hub
            .sessions
            .get_mut(&self.connection)
            .and_then(Session::player_mut)
    }
}
