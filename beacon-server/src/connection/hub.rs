use crate::config::SignallingConfig;
use crate::connection::{PlayerConnection, Session, SfuConnection, StreamerConnection};
use crate::registry::{PlayerRegistry, StreamerRegistry};
use crate::server::{ConnectOptions, PlayerStatus, StatusSnapshot, StreamerStatus, TimerEvent};
use crate::transport::Protocol;
use beacon_core::{ConnectionId, Role, RoutedPayload, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// All routing state: both registries plus every live session.
///
/// Only the server task touches it, one event at a time.
pub struct SessionHub {
    pub(crate) sessions: HashMap<ConnectionId, Session>,
    pub(crate) streamers: StreamerRegistry,
    pub(crate) players: PlayerRegistry,
    pub(crate) config: Arc<SignallingConfig>,
    pub(crate) timer_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl SessionHub {
    pub fn new(config: Arc<SignallingConfig>, timer_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            sessions: HashMap::new(),
            streamers: StreamerRegistry::new(&config),
            players: PlayerRegistry::new(),
            config,
            timer_tx,
        }
    }

    pub fn streamers(&self) -> &StreamerRegistry {
        &self.streamers
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Construct the role object for a freshly accepted connection.
    pub fn open(&mut self, protocol: Protocol, role: Role, options: ConnectOptions) {
        match role {
            Role::Streamer => StreamerConnection::open(self, protocol),
            Role::Player => PlayerConnection::open(self, protocol, options),
            Role::Sfu => SfuConnection::open(self, protocol),
        }
    }

    pub fn handle_message(&mut self, connection: ConnectionId, msg: SignalMessage) {
        let Some(role) = self.sessions.get(&connection).map(Session::role) else {
            warn!("Message '{}' from unknown connection {}", msg.kind(), connection);
            return;
        };

        match role {
            Role::Streamer => StreamerConnection::new(self, connection).on_message(msg),
            Role::Player => PlayerConnection::new(self, connection).on_message(msg),
            Role::Sfu => SfuConnection::new(self, connection).on_message(msg),
        }
    }

    pub fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::IdentifyTimeout(connection) => {
                if self.sessions.contains_key(&connection) {
                    StreamerConnection::new(self, connection).on_identify_timeout();
                }
            }
        }
    }

    /// Tear down a connection whose transport closed. Later calls are no-ops.
    pub fn close(&mut self, connection: ConnectionId) {
        let Some(role) = self.sessions.get(&connection).map(Session::role) else {
            return;
        };

        match role {
            Role::Streamer => StreamerConnection::new(self, connection).on_close(),
            Role::Player => PlayerConnection::new(self, connection).on_close(),
            Role::Sfu => SfuConnection::new(self, connection).on_close(),
        }
    }

    /// Force-close a connection and unwind it immediately.
    pub fn terminate(&mut self, connection: ConnectionId, reason: &str) {
        let Some(session) = self.sessions.get(&connection) else {
            return;
        };

        info!("Terminating {} {}: {}", session.role(), connection, reason);
        session.protocol.disconnect(reason);
        self.close(connection);
    }

    pub(crate) fn send(&self, connection: ConnectionId, msg: SignalMessage) {
        let Some(session) = self.sessions.get(&connection) else {
            warn!("Dropping '{}' for closed connection {}", msg.kind(), connection);
            return;
        };

        let kind = msg.kind();
        if let Err(e) = session.protocol.send_message(msg) {
            warn!("Failed to send '{}' to {}: {}", kind, connection, e);
        }
    }

    pub(crate) fn send_config(&self, connection: ConnectionId) {
        self.send(
            connection,
            SignalMessage::Config {
                peer_connection_options: self.config.peer_connection_options.clone(),
                protocol_version: self.config.protocol_version.clone(),
            },
        );
    }

    /// Deliver a streamer-originated payload to the player named by its stamp.
    ///
    /// The stamp is stripped; a missing stamp or player is logged and dropped.
    pub(crate) fn send_to_player(&self, from: ConnectionId, mut msg: SignalMessage) {
        let kind = msg.kind();
        let Some(player_id) = msg.payload_mut().and_then(RoutedPayload::take_player_id) else {
            error!("'{}' from {} carries no playerId", kind, from);
            return;
        };

        let Some(target) = self.players.get(&player_id) else {
            error!(
                "'{}' from {} addressed to missing player '{}'",
                kind, from, player_id
            );
            return;
        };

        self.send(target, msg);
    }

    /// Remove a streamer identity and tell everything subscribed to it.
    ///
    /// The owning session must already be out of `sessions`.
    pub(crate) fn retire_streamer(&mut self, streamer_id: &str, subscribers: Vec<ConnectionId>) {
        self.streamers.remove(streamer_id);

        for subscriber in subscribers {
            let Some(role) = self.sessions.get(&subscriber).map(Session::role) else {
                continue;
            };

            match role {
                Role::Player => {
                    PlayerConnection::new(self, subscriber).on_streamer_disconnected(streamer_id)
                }
                Role::Sfu => {
                    SfuConnection::new(self, subscriber).on_upstream_disconnected(streamer_id)
                }
                Role::Streamer => {}
            }
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let player_id_of = |connection: &ConnectionId| {
            self.sessions
                .get(connection)
                .and_then(Session::player)
                .map(|player| player.player_id.clone())
        };

        let streamers = self
            .streamers
            .all_ids()
            .into_iter()
            .filter_map(|id| {
                let record = self.streamers.find(&id)?;
                let session = self.sessions.get(&record.connection)?;
                let facet = session.streamer()?;
                Some(StreamerStatus {
                    id,
                    streaming: record.streaming,
                    sfu: session.role() == Role::Sfu,
                    identified: facet.identified,
                    subscribers: facet.subscribers.iter().filter_map(player_id_of).collect(),
                })
            })
            .collect();

        let players = self
            .players
            .list()
            .into_iter()
            .filter_map(|id| {
                let session = self.sessions.get(&self.players.get(&id)?)?;
                let facet = session.player()?;
                Some(PlayerStatus {
                    id,
                    subscribed_to: facet.subscribed.clone(),
                    sfu: session.role() == Role::Sfu,
                })
            })
            .collect();

        StatusSnapshot {
            streamers,
            players,
            streaming_ids: self.streamers.streamer_ids(),
        }
    }
}
