use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque negotiation payload relayed between peers.
///
/// Only the `playerId` routing stamp is interpreted; every other field
/// (SDP, candidates, layer indices...) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutedPayload {
    #[serde(rename = "playerId", default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RoutedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and by callers composing payloads by hand.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach the routing stamp, replacing any stamp the sender supplied.
    pub fn stamped(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    /// Consume the routing stamp before final delivery.
    pub fn take_player_id(&mut self) -> Option<String> {
        self.player_id.take()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
