//! Whisper integration test harness.
//!
//! Every test builds a small mesh of real nodes inside this process. Nodes
//! listen on 127.0.0.1 with OS-assigned ports and talk over real TCP and
//! UDP sockets, so tests never collide with each other or with a node
//! running on the host.
//!
//!   cargo test --test integration

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use whisper_core::config::WhisperConfig;
use whisper_core::Message;
use whisperd::Node;

mod chain;
mod messaging;
mod topology;

// ── Harness ───────────────────────────────────────────────────────────────────

/// How long any single wait in a test may take before it fails.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Quiet period used to assert that something does *not* happen.
pub const SETTLE: Duration = Duration::from_millis(300);

/// Config for a loopback node with discovery off.
pub fn loopback_config() -> WhisperConfig {
    let mut config = WhisperConfig::default();
    config.network.host = "127.0.0.1".to_string();
    config.network.port = 0;
    config.discovery.enabled = false;
    config
}

/// Bind a node from `config` and start its accept loop.
pub async fn start_node_with(config: &WhisperConfig) -> Result<Node> {
    let (node, listener) = Node::bind(config).await.context("failed to bind node")?;
    node.set_echo(false);
    tokio::spawn(node.clone().serve(listener));
    Ok(node)
}

/// Bind a loopback node and start its accept loop.
pub async fn start_node() -> Result<Node> {
    start_node_with(&loopback_config()).await
}

/// Start `n` loopback nodes.
pub async fn start_nodes(n: usize) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(n);
    for _ in 0..n {
        nodes.push(start_node().await?);
    }
    Ok(nodes)
}

/// Poll `cond` until it holds or `TIMEOUT` elapses.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            bail!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Wait until `a` has an outbound link registered for `b`.
pub async fn wait_linked(a: &Node, b: &Node) -> Result<()> {
    let target = b.self_addr().to_string();
    wait_until(&format!("{} -> {}", a.self_addr(), target), || {
        a.registry().contains(&target)
    })
    .await
}

/// Next delivered message on `feed`, or an error after `TIMEOUT`.
pub async fn next_delivery(feed: &mut Receiver<Message>) -> Result<Message> {
    tokio::time::timeout(TIMEOUT, feed.recv())
        .await
        .context("timed out waiting for a delivery")?
        .context("delivery feed closed")
}

/// Assert nothing further arrives on `feed` within `SETTLE`.
pub async fn assert_quiet(feed: &mut Receiver<Message>) -> Result<()> {
    tokio::time::sleep(SETTLE).await;
    match feed.try_recv() {
        Err(TryRecvError::Empty) => Ok(()),
        Ok(m) => bail!("unexpected extra delivery: {m:?}"),
        Err(e) => bail!("delivery feed broken: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Two nodes on loopback get distinct, dialable addresses.
#[tokio::test]
async fn test_nodes_get_distinct_addresses() -> Result<()> {
    let nodes = start_nodes(2).await?;
    assert_ne!(nodes[0].self_addr(), nodes[1].self_addr());
    assert!(nodes[0].self_addr().starts_with("127.0.0.1:"));
    Ok(())
}
