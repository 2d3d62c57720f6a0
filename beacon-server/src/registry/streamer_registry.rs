use crate::config::SignallingConfig;
use crate::error::RegistryError;
use crate::registry::RegistryEvent;
use crate::registry::sanitize::sanitize_streamer_id;
use beacon_core::ConnectionId;
use tokio::sync::broadcast;
use tracing::{error, info};

const EVENT_CAPACITY: usize = 256;

/// Registry-side view of one streamer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamerRecord {
    pub connection: ConnectionId,
    pub streaming: bool,
}

/// Owner of the streamer id namespace.
///
/// Entries keep admission order so "first streamer" is stable, and renames
/// keep their slot.
pub struct StreamerRegistry {
    entries: Vec<(String, StreamerRecord)>,
    default_id: String,
    legacy_prefix: String,
    legacy_counter: u64,
    events: broadcast::Sender<RegistryEvent>,
}

impl StreamerRegistry {
    pub fn new(config: &SignallingConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Vec::new(),
            default_id: config.default_streamer_id.clone(),
            legacy_prefix: config.legacy_streamer_prefix.clone(),
            legacy_counter: 0,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> broadcast::Sender<RegistryEvent> {
        self.events.clone()
    }

    /// Admit a streamer under a collision-free version of `desired`.
    ///
    /// Returns the id it was committed under.
    pub fn add(
        &mut self,
        desired: &str,
        connection: ConnectionId,
        streaming: bool,
    ) -> Result<String, RegistryError> {
        let id = self.resolve(desired)?;

        self.entries.push((
            id.clone(),
            StreamerRecord {
                connection,
                streaming,
            },
        ));
        info!("Streamer '{}' registered ({})", id, connection);
        let _ = self.events.send(RegistryEvent::Added(id.clone()));

        Ok(id)
    }

    /// Re-run sanitize for an already registered streamer.
    ///
    /// The streamer's own current id does not count as a collision. On
    /// refusal the streamer keeps `current`.
    pub fn rename(&mut self, current: &str, desired: &str) -> Result<String, RegistryError> {
        let Some(index) = self.position(current) else {
            return Err(RegistryError::UnknownStreamer {
                id: current.to_owned(),
            });
        };

        let (old_id, record) = self.entries.remove(index);
        let resolved = self.resolve(desired);

        let new_id = match resolved {
            Ok(id) => id,
            Err(e) => {
                self.entries.insert(index, (old_id, record));
                return Err(e);
            }
        };

        self.entries.insert(index, (new_id.clone(), record));
        if new_id != old_id {
            info!("Streamer '{}' renamed to '{}'", old_id, new_id);
            let _ = self.events.send(RegistryEvent::Renamed {
                from: old_id,
                to: new_id.clone(),
            });
        }

        Ok(new_id)
    }

    /// Returns false when `id` was not registered.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        self.entries.remove(index);
        info!("Streamer '{}' removed", id);
        let _ = self.events.send(RegistryEvent::Removed(id.to_owned()));
        true
    }

    pub fn find(&self, id: &str) -> Option<StreamerRecord> {
        self.position(id).map(|index| self.entries[index].1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn set_streaming(&mut self, id: &str, streaming: bool) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.entries[index].1.streaming = streaming;
        true
    }

    /// Ids of streamers that are currently streaming.
    pub fn streamer_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, record)| record.streaming)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every registered id, streaming or not.
    pub fn all_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn first_streamer_id(&self) -> Option<String> {
        self.entries.first().map(|(id, _)| id.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Next fallback id for a streamer that never identified.
    ///
    /// Skips any counter value a client already claimed verbatim.
    pub fn generate_legacy_id(&mut self) -> String {
        loop {
            let id = format!("{}{}", self.legacy_prefix, self.legacy_counter);
            self.legacy_counter += 1;
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn resolve(&self, desired: &str) -> Result<String, RegistryError> {
        let desired = if desired.is_empty() {
            self.default_id.as_str()
        } else {
            desired
        };

        let id = sanitize_streamer_id(desired, self.entries.iter().map(|(id, _)| id.as_str()));
        if self.contains(&id) {
            error!(
                "Streamer id '{}' still collides after sanitizing '{}'",
                id, desired
            );
            return Err(RegistryError::IdCollision { id });
        }

        Ok(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| entry == id)
    }
}
