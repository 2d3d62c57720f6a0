use anyhow::{Context, Result, bail};
use std::time::Duration;
use tokio::sync::mpsc;

use beacon_core::{ConnectionId, Role, SignalMessage};
use beacon_server::{ConnectOptions, InboundFrame, OutboundFrame, Protocol, ServerHandle};

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

/// A raw connection played against a running server.
///
/// Stands in for the socket task: frames the peer sends go through the same
/// `Protocol::receive` path, and everything the server queues for it lands in
/// `outbox_rx`.
pub struct TestPeer {
    pub connection: ConnectionId,
    pub role: Role,
    server: ServerHandle,
    protocol: Protocol,
    outbox_rx: mpsc::UnboundedReceiver<OutboundFrame>,
}

impl TestPeer {
    pub async fn connect(server: &ServerHandle, role: Role) -> Result<Self> {
        Self::connect_with(server, role, ConnectOptions::default()).await
    }

    pub async fn connect_with(
        server: &ServerHandle,
        role: Role,
        options: ConnectOptions,
    ) -> Result<Self> {
        let connection = ConnectionId::new();
        let (tx, outbox_rx) = mpsc::unbounded_channel();
        let protocol = Protocol::new(connection, tx);

        server
            .open(protocol.clone(), role, options)
            .await
            .context("Failed to open connection")?;
        tracing::debug!("[TestPeer] Opened {} {}", role, connection);

        Ok(Self {
            connection,
            role,
            server: server.clone(),
            protocol,
            outbox_rx,
        })
    }

    /// Send a message as the far end would, encoded as a text frame.
    pub async fn send(&self, msg: SignalMessage) -> Result<()> {
        let json = serde_json::to_string(&msg).context("Failed to encode message")?;
        self.send_text(&json).await
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        let Some(msg) = self.protocol.receive(InboundFrame::Text(text.to_owned())) else {
            return Ok(());
        };
        self.server
            .deliver(self.connection, msg)
            .await
            .context("Failed to deliver message")
    }

    pub async fn close(&self) -> Result<()> {
        self.server
            .close(self.connection)
            .await
            .context("Failed to close connection")
    }

    pub async fn recv_frame(&mut self) -> Result<OutboundFrame> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        match tokio::time::timeout(timeout, self.outbox_rx.recv()).await {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => bail!("Outbox of {} closed", self.connection),
            Err(_) => bail!("Timeout waiting for a frame on {}", self.connection),
        }
    }

    pub async fn recv_message(&mut self) -> Result<SignalMessage> {
        match self.recv_frame().await? {
            OutboundFrame::Message(msg) => Ok(msg),
            OutboundFrame::Close { reason } => {
                bail!("{} was closed: {}", self.connection, reason)
            }
        }
    }

    /// Receive the next message and check its `type`.
    pub async fn expect(&mut self, kind: &str) -> Result<SignalMessage> {
        let msg = self.recv_message().await?;
        if msg.kind() != kind {
            bail!("Expected '{}' on {}, got {:?}", kind, self.connection, msg);
        }
        Ok(msg)
    }

    /// Receive the next frame and check it is a close.
    pub async fn expect_close(&mut self) -> Result<String> {
        match self.recv_frame().await? {
            OutboundFrame::Close { reason } => Ok(reason),
            OutboundFrame::Message(msg) => bail!("Expected close, got {:?}", msg),
        }
    }

    /// Wait until the server has applied everything sent so far, then
    /// return whatever is already queued without blocking.
    pub async fn drain(&mut self) -> Result<Vec<OutboundFrame>> {
        self.server.snapshot().await.context("Server stopped")?;

        let mut frames = Vec::new();
        while let Ok(frame) = self.outbox_rx.try_recv() {
            frames.push(frame);
        }
        Ok(frames)
    }
}
