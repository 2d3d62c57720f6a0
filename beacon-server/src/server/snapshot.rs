use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamerStatus {
    pub id: String,
    pub streaming: bool,
    pub sfu: bool,
    /// Answered the identify request, or registered directly as an SFU
    /// endpoint. Legacy streamers admitted on timeout stay `false`.
    pub identified: bool,
    /// Player ids of everything subscribed to this streamer.
    pub subscribers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub id: String,
    pub subscribed_to: Option<String>,
    pub sfu: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub streamers: Vec<StreamerStatus>,
    pub players: Vec<PlayerStatus>,
    /// Ids a player would see in a `streamerList` right now.
    pub streaming_ids: Vec<String>,
}

impl StatusSnapshot {
    pub fn streamer(&self, id: &str) -> Option<&StreamerStatus> {
        self.streamers.iter().find(|s| s.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&PlayerStatus> {
        self.players.iter().find(|p| p.id == id)
    }
}
