use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable key of one accepted transport.
///
/// Unlike streamer and player ids it never changes while the connection
/// lives, so routing state is keyed by it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which accept surface a connection arrived on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Streamer,
    Player,
    Sfu,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Streamer => f.write_str("streamer"),
            Role::Player => f.write_str("player"),
            Role::Sfu => f.write_str("sfu"),
        }
    }
}
