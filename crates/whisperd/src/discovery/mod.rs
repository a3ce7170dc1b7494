//! Local-network discovery.
//!
//! A starting node sends one UDP beacon carrying its listening address.
//! Every node that holds the discovery port dials whatever address a
//! beacon announces. Only one process per host can hold the port; the
//! rest still send their beacon but never hear anyone else's.

pub mod beacon;
pub mod listener;

use whisper_core::config::DiscoveryConfig;

use crate::node::Node;

/// Bind the discovery listener and send the startup beacon.
///
/// Returns the UDP port the listener is bound to, or `None` when inbound
/// discovery is disabled. Never fails: every discovery problem is logged
/// and the node carries on without it.
pub async fn start(node: &Node, config: &DiscoveryConfig) -> Option<u16> {
    if !config.enabled {
        tracing::info!("discovery disabled");
        return None;
    }

    let listen_port = match listener::bind(config.port) {
        Ok(Some(socket)) => {
            let port = socket.local_addr().ok().map(|a| a.port());
            tokio::spawn(listener::listener_loop(socket, node.clone()));
            port
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, port = config.port, "inbound discovery disabled");
            None
        }
    };

    let beacon_port = if config.port == 0 {
        whisper_core::wire::DISCOVERY_PORT
    } else {
        config.port
    };
    if let Err(e) = beacon::send_beacon(node.self_addr(), &config.target, beacon_port).await {
        tracing::warn!(error = %e, target = %config.target, "discovery beacon failed");
    }

    listen_port
}
