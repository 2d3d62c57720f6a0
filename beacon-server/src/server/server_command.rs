use crate::server::StatusSnapshot;
use crate::transport::Protocol;
use beacon_core::{ConnectionId, Role, SignalMessage};
use tokio::sync::oneshot;

/// Options read from the upgrade request of a new connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// The viewer asked to send the offer itself (`OfferToReceive=true`).
    pub offer_to_receive: bool,
}

/// Commands delivered to the server from transport tasks.
#[derive(Debug)]
pub enum ServerCommand {
    /// A transport was accepted on one of the three surfaces.
    Open {
        protocol: Protocol,
        role: Role,
        options: ConnectOptions,
    },

    /// A decoded message from a connection, after keep-alive handling.
    Message {
        connection: ConnectionId,
        message: SignalMessage,
    },

    /// The transport closed.
    Close { connection: ConnectionId },

    /// Read-only projection of the registries.
    Snapshot { reply: oneshot::Sender<StatusSnapshot> },

    /// Close every connection and stop the event loop. Replies once done.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Events the server schedules for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    IdentifyTimeout(ConnectionId),
}
