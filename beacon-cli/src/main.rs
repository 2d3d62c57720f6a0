use anyhow::{Context, Result};
use beacon_core::{IceServerConfig, PeerConnectionOptions};
use beacon_server::{ListenConfig, ServerHandle, SignallingConfig};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(about = "WebRTC signalling relay for streamers, players and SFUs")]
struct Cli {
    /// Address every listener binds to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    #[arg(long, default_value_t = 8888)]
    streamer_port: u16,

    #[arg(long, default_value_t = 80)]
    player_port: u16,

    #[arg(long, default_value_t = 8889)]
    sfu_port: u16,

    /// Seconds a streamer has to answer `identify` before it gets a generated id.
    #[arg(long, default_value_t = 5)]
    identify_timeout_secs: u64,

    /// JSON object sent to every peer as `peerConnectionOptions`.
    #[arg(long, value_name = "JSON")]
    peer_connection_options: Option<String>,

    /// STUN/TURN url; repeat for several. Replaces the default STUN server.
    #[arg(long = "stun-server", value_name = "URL")]
    stun_servers: Vec<String>,

    /// Filter directive, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn signalling_config(&self) -> Result<SignallingConfig> {
        let mut config = SignallingConfig {
            identify_timeout: Duration::from_secs(self.identify_timeout_secs),
            ..Default::default()
        };

        if let Some(json) = &self.peer_connection_options {
            config.peer_connection_options = serde_json::from_str::<PeerConnectionOptions>(json)
                .context("Invalid --peer-connection-options")?;
        }
        if !self.stun_servers.is_empty() {
            config.peer_connection_options.ice_servers = self
                .stun_servers
                .iter()
                .map(|url| IceServerConfig::stun(url.as_str()))
                .collect();
        }

        Ok(config)
    }

    fn listen_config(&self) -> ListenConfig {
        ListenConfig {
            streamer_addr: SocketAddr::new(self.bind, self.streamer_port),
            player_addr: SocketAddr::new(self.bind, self.player_port),
            sfu_addr: SocketAddr::new(self.bind, self.sfu_port),
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid --log-level")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = cli.signalling_config()?;
    let listen = cli.listen_config();

    info!("Initializing signalling server (protocol {})", config.protocol_version);
    let server = ServerHandle::spawn(config);

    beacon_server::serve(&listen, server.clone(), shutdown_signal())
        .await
        .context("Signalling listeners failed")?;

    if let Err(e) = server.shutdown().await {
        warn!("Signalling server already stopped: {}", e);
    }

    info!("Signalling server stopped");
    Ok(())
}
