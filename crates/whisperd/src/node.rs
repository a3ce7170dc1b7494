//! The node: owned state plus the routines every link funnels through.
//!
//! `dial` is the single link-formation path (explicit peer, discovery,
//! reciprocal dial). `originate` and `receive` are the two message paths;
//! both mark the id in the seen cache before broadcasting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use whisper_core::config::WhisperConfig;
use whisper_core::Message;
use whisper_services::{Broadcaster, PeerRegistry, SeenCache};

use crate::link::{InboundLink, OutboundLink};

/// Capacity of the local delivery feed. Slow subscribers lag, they never block links.
const DELIVERY_FEED_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("unable to listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("failed to read listener address: {0}")]
    LocalAddr(std::io::Error),
    #[error("unable to accept connection: {0}")]
    Accept(std::io::Error),
}

/// Handle to a running node. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    /// host:port we listen on. Stamped on originated messages, never dialed.
    self_addr: String,
    nick: String,
    registry: PeerRegistry,
    seen: SeenCache,
    broadcaster: Broadcaster,
    deliveries: broadcast::Sender<Message>,
    /// Print delivered messages to stdout.
    echo: AtomicBool,
}

impl Node {
    /// Build a node that will advertise `self_addr`.
    pub fn new(self_addr: impl Into<String>, nick: impl Into<String>, queue_depth: usize) -> Self {
        let registry = PeerRegistry::new(queue_depth);
        let (deliveries, _) = broadcast::channel(DELIVERY_FEED_CAPACITY);
        Self {
            inner: Arc::new(NodeInner {
                self_addr: self_addr.into(),
                nick: nick.into(),
                broadcaster: Broadcaster::new(registry.clone()),
                registry,
                seen: SeenCache::new(),
                deliveries,
                echo: AtomicBool::new(true),
            }),
        }
    }

    /// Bind the peer-link listener described by `config` and build the node around it.
    ///
    /// Failing to bind is fatal for the process; the caller decides how to exit.
    pub async fn bind(config: &WhisperConfig) -> Result<(Self, TcpListener), NodeError> {
        let host = if config.network.host.is_empty() {
            detect_host().to_string()
        } else {
            config.network.host.clone()
        };

        let listener = TcpListener::bind((host.as_str(), config.network.port))
            .await
            .map_err(|source| NodeError::Bind {
                addr: format!("{}:{}", host, config.network.port),
                source,
            })?;
        let self_addr = listener.local_addr().map_err(NodeError::LocalAddr)?;

        let node = Node::new(
            self_addr.to_string(),
            config.node.nick.clone(),
            config.node.queue_depth,
        );
        Ok((node, listener))
    }

    /// Turn printing of delivered messages on or off. In-process test meshes turn it off.
    pub fn set_echo(&self, on: bool) {
        self.inner.echo.store(on, Ordering::Relaxed);
    }

    pub fn self_addr(&self) -> &str {
        &self.inner.self_addr
    }

    pub fn nick(&self) -> &str {
        &self.inner.nick
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.inner.registry
    }

    pub fn seen(&self) -> &SeenCache {
        &self.inner.seen
    }

    /// Feed of every message this node delivers from a peer, in delivery order.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.inner.deliveries.subscribe()
    }

    /// Open an outbound link to `addr` unless one already exists.
    ///
    /// Our own address and empty addresses are refused before touching the
    /// registry. Returns the link task when a new link was started.
    pub fn dial(&self, addr: &str) -> Option<JoinHandle<()>> {
        if addr.is_empty() || addr == self.self_addr() {
            tracing::trace!(peer = %addr, "not dialing self");
            return None;
        }

        let queue = self.inner.registry.add(addr)?;
        let link = OutboundLink::new(addr.to_string(), queue, self.inner.registry.clone());
        let peer = addr.to_string();

        Some(tokio::spawn(async move {
            match link.run().await {
                Ok(written) => tracing::info!(peer = %peer, written, "peer link closed"),
                Err(e) => tracing::warn!(peer = %peer, error = %e, "peer link failed"),
            }
        }))
    }

    /// Originate a message from this node and flood it to every peer.
    pub fn originate(&self, body: impl Into<String>) -> Message {
        let message = Message::originate(self.self_addr(), body, self.nick());
        // Mark it so the copies that loop back to us are dropped.
        self.inner.seen.check_and_mark(&message.id);
        self.inner.broadcaster.broadcast(&message);
        message
    }

    /// Process one message decoded from an inbound link.
    ///
    /// Returns `false` when the id was already seen and the message was
    /// dropped. Otherwise the message is displayed, forwarded to every
    /// peer, and its origin is dialed so the mesh grows toward it.
    pub fn receive(&self, message: Message) -> bool {
        if self.inner.seen.check_and_mark(&message.id) {
            return false;
        }

        if self.inner.echo.load(Ordering::Relaxed) {
            println!("{}: {}", message.display_name(), message.body);
        }
        // No subscribers is fine.
        let _ = self.inner.deliveries.send(message.clone());

        self.inner.broadcaster.broadcast(&message);
        self.dial(&message.addr);
        true
    }

    /// Accept peer connections forever, one inbound link task per connection.
    pub async fn serve(self, listener: TcpListener) -> Result<(), NodeError> {
        tracing::info!(addr = %self.self_addr(), "accepting peer links");
        loop {
            let (socket, remote) = listener.accept().await.map_err(NodeError::Accept)?;
            self.spawn_inbound(socket, remote);
        }
    }

    fn spawn_inbound(&self, socket: TcpStream, remote: SocketAddr) -> JoinHandle<()> {
        let link = InboundLink::new(self.clone(), socket, remote);
        tokio::spawn(async move {
            match link.run().await {
                Ok(received) => tracing::info!(%remote, received, "disconnected"),
                Err(e) => tracing::warn!(%remote, error = %e, "inbound link failed"),
            }
        })
    }
}

/// Best guess at the address other hosts can reach us on.
///
/// Connecting a UDP socket sends nothing; it only asks the kernel which
/// local address routes outward. Falls back to loopback.
pub fn detect_host() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("192.0.2.1:9")?;
        Ok(socket.local_addr()?.ip())
    };
    match probe() {
        Ok(ip) if !ip.is_unspecified() => ip,
        _ => IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}

impl whisper_api::Originator for Node {
    fn originate(&self, body: String) -> Message {
        Node::originate(self, body)
    }
}
