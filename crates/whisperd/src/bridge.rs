//! Redis pub/sub bridge.
//!
//! Messages delivered from peers are published to one channel; messages
//! published by others on a second channel are originated by this node.

use anyhow::{Context, Result};
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use whisper_core::config::BridgeConfig;
use whisper_core::Message;

use crate::node::Node;

const BUS_VERSION: u32 = 1;

#[derive(Serialize)]
struct BusMessage<'a> {
    version: u32,
    #[serde(rename = "type")]
    kind: &'a str,
    data: BusData<'a>,
}

#[derive(Serialize)]
struct BusData<'a> {
    sender: &'a str,
    message: &'a str,
}

/// Only the body matters; `version`, `type`, and `data.to` are accepted and ignored.
#[derive(Deserialize)]
struct IncomingBusMessage {
    data: IncomingData,
}

#[derive(Deserialize)]
struct IncomingData {
    message: String,
}

/// Render a delivered message in the bus format.
fn to_bus_payload(message: &Message) -> Result<String> {
    let out = BusMessage {
        version: BUS_VERSION,
        kind: "privmsg",
        data: BusData {
            sender: &message.addr,
            message: &message.body,
        },
    };
    serde_json::to_string(&out).context("failed to encode bus message")
}

/// Extract the body to originate from a bus payload.
fn parse_bus_payload(payload: &str) -> Result<String> {
    let incoming: IncomingBusMessage =
        serde_json::from_str(payload).context("malformed bus message")?;
    Ok(incoming.data.message)
}

/// Run both directions of the bridge until either fails.
pub async fn run(node: Node, config: BridgeConfig) -> Result<()> {
    let client = redis::Client::open(config.redis_url.as_str())
        .with_context(|| format!("invalid redis url {}", config.redis_url))?;
    tracing::info!(
        url = %config.redis_url,
        publish = %config.publish_channel,
        subscribe = %config.subscribe_channel,
        "redis bridge starting"
    );

    tokio::select! {
        r = publish_loop(node.clone(), client.clone(), config.publish_channel) => r,
        r = subscribe_loop(node, client, config.subscribe_channel) => r,
    }
}

async fn publish_loop(node: Node, client: redis::Client, channel: String) -> Result<()> {
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .context("failed to connect to redis")?;
    let mut feed = node.subscribe();

    loop {
        let message = match feed.recv().await {
            Ok(m) => m,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "bridge fell behind the delivery feed");
                continue;
            }
            Err(RecvError::Closed) => return Ok(()),
        };

        let payload = to_bus_payload(&message)?;
        if let Err(e) = conn.publish::<_, _, ()>(&channel, payload).await {
            tracing::warn!(error = %e, channel = %channel, "redis publish failed");
        }
    }
}

async fn subscribe_loop(node: Node, client: redis::Client, channel: String) -> Result<()> {
    let mut pubsub = client
        .get_async_connection()
        .await
        .context("failed to connect to redis")?
        .into_pubsub();
    pubsub
        .subscribe(&channel)
        .await
        .with_context(|| format!("failed to subscribe to {channel}"))?;

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable bus payload");
                continue;
            }
        };
        match parse_bus_payload(&payload) {
            Ok(body) if !body.is_empty() => {
                let message = node.originate(body);
                tracing::debug!(id = %message.id, "originated from bus");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring bus message"),
        }
    }

    anyhow::bail!("redis subscription on {channel} ended")
}
