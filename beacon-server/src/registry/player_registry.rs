use crate::registry::RegistryEvent;
use beacon_core::ConnectionId;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::info;

const PLAYER_ID_PREFIX: &str = "Player";
const EVENT_CAPACITY: usize = 256;

struct PlayerEntry {
    connection: ConnectionId,
    seq: u64,
}

/// Owner of the player id namespace. Ids are sequential and never reused.
pub struct PlayerRegistry {
    players: HashMap<String, PlayerEntry>,
    next_id: u64,
    events: broadcast::Sender<RegistryEvent>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            players: HashMap::new(),
            next_id: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> broadcast::Sender<RegistryEvent> {
        self.events.clone()
    }

    /// Assign the next player id to `connection`.
    pub fn add(&mut self, connection: ConnectionId) -> String {
        let seq = self.next_id;
        self.next_id += 1;

        let id = format!("{PLAYER_ID_PREFIX}{seq}");
        self.players
            .insert(id.clone(), PlayerEntry { connection, seq });

        info!("Player '{}' registered ({})", id, connection);
        let _ = self.events.send(RegistryEvent::Added(id.clone()));
        id
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if self.players.remove(id).is_none() {
            return false;
        }

        info!("Player '{}' removed", id);
        let _ = self.events.send(RegistryEvent::Removed(id.to_owned()));
        true
    }

    pub fn has(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<ConnectionId> {
        self.players.get(id).map(|entry| entry.connection)
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Player ids in admission order.
    pub fn list(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.players.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
