use crate::connection::{Session, SessionHub, SessionRole, StreamerFacet};
use crate::server::TimerEvent;
use crate::transport::Protocol;
use beacon_core::{ConnectionId, SignalMessage};
use tracing::{debug, error, info, warn};

/// Handler for one streamer session, borrowed from the hub per event.
pub(crate) struct StreamerConnection<'a> {
    hub: &'a mut SessionHub,
    connection: ConnectionId,
}

impl<'a> StreamerConnection<'a> {
    pub(crate) fn new(hub: &'a mut SessionHub, connection: ConnectionId) -> Self {
        Self { hub, connection }
    }

    /// Accept a streamer: send `config`, ask it to identify, arm the timer.
    pub(crate) fn open(hub: &'a mut SessionHub, protocol: Protocol) {
        let connection = protocol.connection();
        info!("Streamer connected: {}", connection);

        hub.sessions.insert(
            connection,
            Session {
                protocol,
                role: SessionRole::Streamer(StreamerFacet::default()),
            },
        );
        hub.send_config(connection);
        hub.send(connection, SignalMessage::Identify);

        let timeout = hub.config.identify_timeout;
        let timer_tx = hub.timer_tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = timer_tx.send(TimerEvent::IdentifyTimeout(connection));
        });

        if let Some(facet) = hub.sessions.get_mut(&connection).and_then(Session::streamer_mut) {
            facet.identify_timer = Some(timer.abort_handle());
        }
    }

    pub(crate) fn on_message(self, msg: SignalMessage) {
        match msg {
            SignalMessage::EndpointId { id } => self.on_endpoint_id(&id),
            SignalMessage::Offer(_) | SignalMessage::Answer(_) | SignalMessage::IceCandidate(_) => {
                self.hub.send_to_player(self.connection, msg)
            }
            SignalMessage::DisconnectPlayer { player_id, reason } => {
                self.on_disconnect_player(&player_id, reason.as_deref())
            }
            SignalMessage::LayerPreference(_) => self.on_layer_preference(msg),
            other => debug!(
                "Streamer {} sent unhandled '{}'",
                self.connection,
                other.kind()
            ),
        }
    }

    pub(crate) fn on_identify_timeout(mut self) {
        let Some(facet) = self.facet_mut() else {
            return;
        };
        // A cancelled timer may still have queued its event.
        if facet.identify_timer.take().is_none() {
            return;
        }

        let legacy_id = self.hub.streamers.generate_legacy_id();
        warn!(
            "Streamer {} did not identify in time, assigning '{}'",
            self.connection, legacy_id
        );
        self.admit(&legacy_id);
    }

    pub(crate) fn on_close(self) {
        let Some(mut session) = self.hub.sessions.remove(&self.connection) else {
            return;
        };
        info!("Streamer disconnected: {}", self.connection);

        let Some(facet) = session.streamer_mut() else {
            return;
        };
        facet.cancel_identify_timer();

        if let Some(streamer_id) = facet.streamer_id.take() {
            let subscribers = std::mem::take(&mut facet.subscribers);
            self.hub.retire_streamer(&streamer_id, subscribers);
        }
    }

    fn on_endpoint_id(mut self, desired: &str) {
        let Some(facet) = self.facet_mut() else {
            return;
        };
        facet.identified = true;

        match facet.streamer_id.clone() {
            None => {
                facet.cancel_identify_timer();
                self.admit(desired);
            }
            Some(current) => self.rename(&current, desired),
        }
    }

    fn admit(mut self, desired: &str) {
        match self.hub.streamers.add(desired, self.connection, true) {
            Ok(committed_id) => {
                if let Some(facet) = self.facet_mut() {
                    facet.streamer_id = Some(committed_id.clone());
                }
                self.hub.send(
                    self.connection,
                    SignalMessage::EndpointIdConfirm { committed_id },
                );
            }
            Err(e) => {
                error!("Refusing streamer {}: {}", self.connection, e);
                self.hub.terminate(self.connection, "Streamer id already in use");
            }
        }
    }

    fn rename(mut self, current: &str, desired: &str) {
        let new_id = match self.hub.streamers.rename(current, desired) {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    "Streamer '{}' cannot be renamed to '{}': {}",
                    current, desired, e
                );
                return;
            }
        };

        let subscribers = match self.facet_mut() {
            Some(facet) => {
                facet.streamer_id = Some(new_id.clone());
                facet.subscribers.clone()
            }
            None => Vec::new(),
        };

        if new_id != current {
            for subscriber in subscribers {
                let Some(player) = self
                    .hub
                    .sessions
                    .get_mut(&subscriber)
                    .and_then(Session::player_mut)
                else {
                    continue;
                };
                player.subscribed = Some(new_id.clone());
                self.hub.send(
                    subscriber,
                    SignalMessage::StreamerIdChanged {
                        new_id: new_id.clone(),
                    },
                );
            }
        }

        self.hub.send(
            self.connection,
            SignalMessage::EndpointIdConfirm {
                committed_id: new_id,
            },
        );
    }

    fn on_disconnect_player(self, player_id: &str, reason: Option<&str>) {
        let Some(target) = self.hub.players.get(player_id) else {
            warn!(
                "Streamer {} asked to disconnect missing player '{}'",
                self.connection, player_id
            );
            return;
        };

        self.hub
            .terminate(target, reason.unwrap_or("Disconnected by streamer"));
    }

    /// Pass a layer preference down to every SFU subscribed to this streamer.
    fn on_layer_preference(self, msg: SignalMessage) {
        let subscribers = self
            .hub
            .sessions
            .get(&self.connection)
            .and_then(Session::streamer)
            .map(|facet| facet.subscribers.clone())
            .unwrap_or_default();

        for subscriber in subscribers {
            let is_sfu = self
                .hub
                .sessions
                .get(&subscriber)
                .is_some_and(|s| matches!(s.role, SessionRole::Sfu { .. }));
            if is_sfu {
                self.hub.send(subscriber, msg.clone());
            }
        }
    }

    fn facet_mut(&mut self) -> Option<&mut StreamerFacet> {
        self.hub
            .sessions
            .get_mut(&self.connection)
            .and_then(Session::streamer_mut)
    }
}
