use crate::server::{ConnectOptions, ServerHandle};
use crate::transport::{InboundFrame, OutboundFrame, Protocol};
use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{ConnectionId, Role};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Query string accepted on the player surface.
///
/// Values are kept as text so a malformed flag falls back to the default
/// instead of rejecting the upgrade.
#[derive(Debug, Default, Deserialize)]
pub struct PlayerQuery {
    #[serde(rename = "OfferToReceive", default)]
    pub offer_to_receive: Option<String>,
}

impl PlayerQuery {
    pub fn connect_options(&self) -> ConnectOptions {
        let offer_to_receive = self
            .offer_to_receive
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

        ConnectOptions { offer_to_receive }
    }
}

pub async fn streamer_ws_handler(
    ws: WebSocketUpgrade,
    State(server): State<ServerHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, Role::Streamer, ConnectOptions::default(), server)
    })
}

pub async fn player_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<PlayerQuery>,
    State(server): State<ServerHandle>,
) -> impl IntoResponse {
    let options = query.connect_options();

    ws.on_upgrade(move |socket| handle_socket(socket, Role::Player, options, server))
}

pub async fn sfu_ws_handler(
    ws: WebSocketUpgrade,
    State(server): State<ServerHandle>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, Role::Sfu, ConnectOptions::default(), server))
}

async fn handle_socket(
    socket: WebSocket,
    role: Role,
    options: ConnectOptions,
    server: ServerHandle,
) {
    let connection = ConnectionId::new();
    info!("New {} WebSocket connection: {}", role, connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let protocol = Protocol::new(connection, tx);

    if let Err(e) = server.open(protocol.clone(), role, options).await {
        error!("Cannot register {}: {}", connection, e);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Message(msg) => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to encode '{}' for {}: {}", msg.kind(), connection, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close { reason } => {
                    let frame = CloseFrame {
                        code: close_code::NORMAL,
                        reason: reason.into(),
                    };
                    let _ = sender.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let server = server.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let frame = match msg {
                    Message::Text(text) => InboundFrame::Text(text.as_str().to_owned()),
                    Message::Binary(data) => InboundFrame::Binary(data),
                    Message::Close(_) => break,
                    _ => continue,
                };

                let Some(message) = protocol.receive(frame) else {
                    continue;
                };
                if let Err(e) = server.deliver(connection, message).await {
                    error!("Dropping message from {}: {}", connection, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = server.close(connection).await;
    info!("WebSocket disconnected: {} {}", role, connection);
}
