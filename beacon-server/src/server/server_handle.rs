use crate::config::SignallingConfig;
use crate::error::ServerError;
use crate::registry::RegistryEvent;
use crate::server::{ConnectOptions, ServerCommand, SignallingServer, StatusSnapshot};
use crate::transport::Protocol;
use beacon_core::{ConnectionId, Role, SignalMessage};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::info;

const COMMAND_CAPACITY: usize = 1024;

/// Cloneable front door to a running [`SignallingServer`].
#[derive(Clone)]
pub struct ServerHandle {
    command_tx: mpsc::Sender<ServerCommand>,
    streamer_events: broadcast::Sender<RegistryEvent>,
    player_events: broadcast::Sender<RegistryEvent>,
}

impl ServerHandle {
    /// Start the event loop on the current runtime.
    ///
    /// It runs until [`ServerHandle::shutdown`] is called or every handle
    /// has been dropped.
    pub fn spawn(config: SignallingConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let server = SignallingServer::new(config, command_rx);

        let handle = Self {
            command_tx,
            streamer_events: server.hub().streamers().events(),
            player_events: server.hub().players().events(),
        };

        tokio::spawn(server.run());
        info!("Spawned signalling server");

        handle
    }

    pub async fn open(
        &self,
        protocol: Protocol,
        role: Role,
        options: ConnectOptions,
    ) -> Result<(), ServerError> {
        self.command(ServerCommand::Open {
            protocol,
            role,
            options,
        })
        .await
    }

    pub async fn deliver(
        &self,
        connection: ConnectionId,
        message: SignalMessage,
    ) -> Result<(), ServerError> {
        self.command(ServerCommand::Message {
            connection,
            message,
        })
        .await
    }

    pub async fn close(&self, connection: ConnectionId) -> Result<(), ServerError> {
        self.command(ServerCommand::Close { connection }).await
    }

    pub async fn snapshot(&self) -> Result<StatusSnapshot, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.command(ServerCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| ServerError::Stopped)
    }

    /// Close every connection and stop the event loop.
    ///
    /// Resolves once the loop has finished. A second call returns
    /// [`ServerError::Stopped`].
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        let (reply, rx) = oneshot::channel();
        self.command(ServerCommand::Shutdown { reply }).await?;
        rx.await.map_err(|_| ServerError::Stopped)
    }

    pub fn subscribe_streamer_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.streamer_events.subscribe()
    }

    pub fn subscribe_player_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.player_events.subscribe()
    }

    async fn command(&self, cmd: ServerCommand) -> Result<(), ServerError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ServerError::Stopped)
    }
}
