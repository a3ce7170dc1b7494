//! whisperd: Whisper gossip daemon.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use whisper_core::config::WhisperConfig;
use whisperd::{discovery, input, Node};

/// Flood-broadcast chat node. Lines typed on stdin are sent to the mesh.
#[derive(Parser, Debug)]
#[command(name = "whisperd", version, about)]
struct Args {
    /// Peer host:port to dial at startup.
    #[arg(long)]
    peer: Option<String>,

    /// TCP port to listen on for peer links.
    #[arg(long)]
    port: Option<u16>,

    /// Nickname shown next to messages we send.
    #[arg(long)]
    nick: Option<String>,

    /// Host to listen on and advertise. Auto-detected when unset.
    #[arg(long)]
    host: Option<String>,

    /// Serve GET /peers and the compose page on this port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Neither send a discovery beacon nor listen for one.
    #[arg(long)]
    no_discovery: bool,

    /// Config file. Defaults to $WHISPER_CONFIG or ~/.config/whisper/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bridge messages to and from this Redis server.
    #[cfg(feature = "redis-bridge")]
    #[arg(long)]
    redis_url: Option<String>,
}

impl Args {
    /// Flags win over the config file and environment.
    fn apply(&self, config: &mut WhisperConfig) {
        if let Some(peer) = &self.peer {
            config.network.peer = peer.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(nick) = &self.nick {
            config.node.nick = nick.clone();
        }
        if let Some(host) = &self.host {
            config.network.host = host.clone();
        }
        if let Some(port) = self.api_port {
            config.api.port = port;
        }
        if self.no_discovery {
            config.discovery.enabled = false;
        }
        #[cfg(feature = "redis-bridge")]
        {
            if let Some(url) = &self.redis_url {
                config.bridge.redis_url = url.clone();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WhisperConfig::load_from(path),
        None => WhisperConfig::load(),
    }
    .context("failed to load config")?;
    args.apply(&mut config);

    let (node, listener) = Node::bind(&config).await.context("startup failed")?;
    if config.node.nick.is_empty() {
        tracing::info!(addr = %node.self_addr(), "listening");
    } else {
        tracing::info!(addr = %node.self_addr(), nick = %config.node.nick, "listening");
    }

    if config.node.seen_ttl_secs > 0 {
        let ttl = Duration::from_secs(config.node.seen_ttl_secs);
        tracing::info!(ttl_secs = config.node.seen_ttl_secs, "seen message ids will expire");
        tokio::spawn(node.seen().clone().expiry_loop(ttl));
    }

    // ── Link formation ───────────────────────────────────────────────────────

    discovery::start(&node, &config.discovery).await;

    if config.network.peer.is_empty() {
        tracing::info!("no peer specified, waiting to receive discovery packets");
    } else {
        node.dial(&config.network.peer);
    }

    // ── Origination paths ────────────────────────────────────────────────────

    {
        let node = node.clone();
        tokio::spawn(async move {
            match input::read_input(node, tokio::io::stdin()).await {
                Ok(sent) => tracing::info!(sent, "stdin closed"),
                Err(e) => tracing::error!(error = %e, "failed to read stdin"),
            }
        });
    }

    if config.api.port != 0 {
        let state = whisper_api::ApiState {
            registry: node.registry().clone(),
            originator: Arc::new(node.clone()),
        };
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = whisper_api::serve(state, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    #[cfg(feature = "redis-bridge")]
    {
        if !config.bridge.redis_url.is_empty() {
            let node = node.clone();
            let bridge = config.bridge.clone();
            tokio::spawn(async move {
                if let Err(e) = whisperd::bridge::run(node, bridge).await {
                    tracing::error!(error = %e, "redis bridge failed");
                }
            });
        }
    }

    // ── Accept loop ──────────────────────────────────────────────────────────

    let accept_task = tokio::spawn(node.serve(listener));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown signal received"),
        r = accept_task => {
            r.context("accept loop panicked")?
                .context("accept loop failed")?;
        }
    }

    Ok(())
}
