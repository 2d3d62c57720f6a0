use crate::error::ProtocolError;
use crate::transport::{InboundFrame, OutboundFrame};
use beacon_core::{ConnectionId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-connection message endpoint handed to the routing layer.
///
/// Sending never blocks: frames are queued for the connection's writer task.
#[derive(Debug, Clone)]
pub struct Protocol {
    connection: ConnectionId,
    outbox: mpsc::UnboundedSender<OutboundFrame>,
}

impl Protocol {
    pub fn new(connection: ConnectionId, outbox: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { connection, outbox }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn send_message(&self, msg: SignalMessage) -> Result<(), ProtocolError> {
        self.outbox
            .send(OutboundFrame::Message(msg))
            .map_err(|_| ProtocolError::Closed)
    }

    /// Queue a close; the writer task shuts the socket once it drains.
    pub fn disconnect(&self, reason: impl Into<String>) {
        let _ = self.outbox.send(OutboundFrame::Close {
            reason: reason.into(),
        });
    }

    pub fn is_connected(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Decode one inbound frame and answer keep-alives.
    ///
    /// Returns the message only when a higher-level handler should see it:
    /// `ping` is answered here with a `pong` carrying the same time, and
    /// undecodable frames or unknown types are dropped.
    pub fn receive(&self, frame: InboundFrame) -> Option<SignalMessage> {
        let msg = match decode_frame(frame) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("Dropping frame from {}: {}", self.connection, e);
                return None;
            }
        };

        if let SignalMessage::Ping { time } = msg {
            if let Err(e) = self.send_message(SignalMessage::Pong { time }) {
                warn!("Failed to answer ping from {}: {}", self.connection, e);
            }
            return None;
        }

        Some(msg)
    }
}

pub fn decode_frame(frame: InboundFrame) -> Result<SignalMessage, ProtocolError> {
    match frame {
        InboundFrame::Text(text) => Ok(serde_json::from_str(&text)?),
        InboundFrame::Binary(data) => {
            let text = std::str::from_utf8(&data)?;
            Ok(serde_json::from_str(text)?)
        }
    }
}
