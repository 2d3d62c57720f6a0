//! Integration tests for beacon_server.
//!
//! Tests are organized by role:
//! - `streamer_tests` - identification, renames and streamer teardown
//! - `player_tests` - subscriptions and negotiation forwarding
//! - `sfu_tests` - SFU routing and dual-registry teardown
//! - `server_tests` - event loop lifecycle


use std::time::Duration;
use tracing::Level;

use beacon_server::{ServerHandle, SignallingConfig};

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Spawn a server with default settings.
pub fn create_test_server() -> ServerHandle {
    ServerHandle::spawn(SignallingConfig::default())
}

/// Spawn a server whose identify timer fires after `timeout`.
pub fn create_test_server_with_timeout(timeout: Duration) -> ServerHandle {
    ServerHandle::spawn(SignallingConfig {
        identify_timeout: timeout,
        ..Default::default()
    })
}
