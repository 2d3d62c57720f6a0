mod hub;
mod player;
mod sfu;
mod streamer;

pub use hub::*;
pub(crate) use player::PlayerConnection;
pub(crate) use sfu::SfuConnection;
pub(crate) use streamer::StreamerConnection;

use crate::transport::Protocol;
use beacon_core::{ConnectionId, Role};
use tokio::task::AbortHandle;

/// State a session holds as a media source.
#[derive(Debug, Default)]
pub struct StreamerFacet {
    /// None until the streamer has been admitted to the registry.
    pub streamer_id: Option<String>,
    /// Players and SFUs subscribed to this streamer, in subscribe order.
    pub subscribers: Vec<ConnectionId>,
    pub identify_timer: Option<AbortHandle>,
    pub identified: bool,
}

impl StreamerFacet {
    pub(crate) fn attach(&mut self, subscriber: ConnectionId) {
        if !self.subscribers.contains(&subscriber) {
            self.subscribers.push(subscriber);
        }
    }

    pub(crate) fn detach(&mut self, subscriber: ConnectionId) {
        self.subscribers.retain(|c| *c != subscriber);
    }

    /// Returns true if a pending timer was cancelled by this call.
    pub(crate) fn cancel_identify_timer(&mut self) -> bool {
        match self.identify_timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }
}

/// State a session holds as a viewer.
#[derive(Debug)]
pub struct PlayerFacet {
    pub player_id: String,
    /// Id of the subscribed streamer, kept current across renames.
    pub subscribed: Option<String>,
    pub send_offer: bool,
}

#[derive(Debug)]
pub enum SessionRole {
    Streamer(StreamerFacet),
    Player(PlayerFacet),
    Sfu {
        streamer: StreamerFacet,
        player: PlayerFacet,
    },
}

/// One accepted connection and its role state.
#[derive(Debug)]
pub struct Session {
    pub protocol: Protocol,
    pub role: SessionRole,
}

impl Session {
    pub fn role(&self) -> Role {
        match self.role {
            SessionRole::Streamer(_) => Role::Streamer,
            SessionRole::Player(_) => Role::Player,
            SessionRole::Sfu { .. } => Role::Sfu,
        }
    }

    pub fn streamer(&self) -> Option<&StreamerFacet> {
        match &self.role {
            SessionRole::Streamer(facet) | SessionRole::Sfu { streamer: facet, .. } => Some(facet),
            SessionRole::Player(_) => None,
        }
    }

    pub fn streamer_mut(&mut self) -> Option<&mut StreamerFacet> {
        match &mut self.role {
            SessionRole::Streamer(facet) | SessionRole::Sfu { streamer: facet, .. } => Some(facet),
            SessionRole::Player(_) => None,
        }
    }

    pub fn player(&self) -> Option<&PlayerFacet> {
        match &self.role {
            SessionRole::Player(facet) | SessionRole::Sfu { player: facet, .. } => Some(facet),
            SessionRole::Streamer(_) => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerFacet> {
        match &mut self.role {
            SessionRole::Player(facet) | SessionRole::Sfu { player: facet, .. } => Some(facet),
            SessionRole::Streamer(_) => None,
        }
    }
}
