use crate::config::ListenConfig;
use crate::server::ServerHandle;
use crate::signaling::{player_ws_handler, sfu_ws_handler, streamer_ws_handler};
use axum::Router;
use axum::routing::get;
use std::io;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub fn streamer_router(server: ServerHandle) -> Router {
    Router::new()
        .route("/", get(streamer_ws_handler))
        .route("/{*path}", get(streamer_ws_handler))
        .with_state(server)
}

pub fn player_router(server: ServerHandle) -> Router {
    Router::new()
        .route("/", get(player_ws_handler))
        .route("/{*path}", get(player_ws_handler))
        .with_state(server)
}

pub fn sfu_router(server: ServerHandle) -> Router {
    Router::new()
        .route("/", get(sfu_ws_handler))
        .route("/{*path}", get(sfu_ws_handler))
        .with_state(server)
}

/// Bind the three accept surfaces and serve them until `shutdown` resolves.
pub async fn serve<F>(listen: &ListenConfig, server: ServerHandle, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let streamer_listener = TcpListener::bind(listen.streamer_addr).await?;
    let player_listener = TcpListener::bind(listen.player_addr).await?;
    let sfu_listener = TcpListener::bind(listen.sfu_addr).await?;

    info!("Listening for streamers on {}", streamer_listener.local_addr()?);
    info!("Listening for players on {}", player_listener.local_addr()?);
    info!("Listening for SFUs on {}", sfu_listener.local_addr()?);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown.await;
        let _ = stop_tx.send(true);
    });

    let stopped = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    tokio::try_join!(
        axum::serve(streamer_listener, streamer_router(server.clone()))
            .with_graceful_shutdown(stopped(stop_rx.clone()))
            .into_future(),
        axum::serve(player_listener, player_router(server.clone()))
            .with_graceful_shutdown(stopped(stop_rx.clone()))
            .into_future(),
        axum::serve(sfu_listener, sfu_router(server))
            .with_graceful_shutdown(stopped(stop_rx))
            .into_future(),
    )?;

    info!("All listeners stopped");
    Ok(())
}
