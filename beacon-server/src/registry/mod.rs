mod player_registry;
mod sanitize;
mod streamer_registry;

pub use player_registry::*;
pub use sanitize::*;
pub use streamer_registry::*;

/// Membership change published by either registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(String),
    Removed(String),
    Renamed { from: String, to: String },
}
