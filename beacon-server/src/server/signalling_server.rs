use crate::config::SignallingConfig;
use crate::connection::SessionHub;
use crate::server::{ServerCommand, TimerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The routing actor. Owns the hub and applies one event at a time.
pub struct SignallingServer {
    hub: SessionHub,
    command_rx: mpsc::Receiver<ServerCommand>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
}

impl SignallingServer {
    pub fn new(config: SignallingConfig, command_rx: mpsc::Receiver<ServerCommand>) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        Self {
            hub: SessionHub::new(Arc::new(config), timer_tx),
            command_rx,
            timer_rx,
        }
    }

    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }

    pub async fn run(mut self) {
        info!("Signalling event loop started");

        let mut stopped_by = None;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ServerCommand::Shutdown { reply }) => {
                            info!("Shutdown requested");
                            stopped_by = Some(reply);
                            break;
                        }
                        Some(c) => self.handle_command(c),
                        None => {
                            info!("Command channel closed. Shutting down signalling server.");
                            break;
                        }
                    }
                }

                evt = self.timer_rx.recv() => {
                    match evt {
                        Some(e) => self.hub.handle_timer(e),
                        None => {
                            warn!("Timer channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        self.command_rx.close();
        self.shutdown();
        info!("Signalling event loop finished");

        if let Some(reply) = stopped_by {
            let _ = reply.send(());
        }
    }

    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Open {
                protocol,
                role,
                options,
            } => {
                debug!("Opening {} {}", role, protocol.connection());
                self.hub.open(protocol, role, options);
            }

            ServerCommand::Message {
                connection,
                message,
            } => self.hub.handle_message(connection, message),

            ServerCommand::Close { connection } => self.hub.close(connection),

            ServerCommand::Snapshot { reply } => {
                if reply.send(self.hub.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
            }

            // Intercepted by the event loop before dispatch.
            ServerCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// Close every remaining connection so writer tasks can finish.
    ///
    /// Safe to call on an already drained hub.
    fn shutdown(&mut self) {
        let connections: Vec<_> = self.hub.sessions.keys().copied().collect();
        if connections.is_empty() {
            return;
        }

        info!("Closing {} remaining connections", connections.len());
        for connection in connections {
            self.hub.terminate(connection, "Server shutting down");
        }
    }
}
