//! Outbound link: one TCP connection to one peer we dialed.
//!
//! Created → Connecting → Streaming → Closed. There is no retry: once
//! closed, the address is free and the next dial starts a fresh link.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use whisper_core::{wire, Message};
use whisper_services::PeerRegistry;

use super::{LinkError, LinkState};

/// Removes the registry entry when the link ends, however it ends.
struct Registration {
    registry: PeerRegistry,
    peer: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove_closed(&self.peer);
    }
}

pub struct OutboundLink {
    peer: String,
    queue: mpsc::Receiver<Message>,
    state: LinkState,
    // Must stay after `queue`: fields drop in order, and the entry is only
    // removed once its receiver is gone.
    _registration: Registration,
}

impl OutboundLink {
    /// Wrap a queue freshly returned by `PeerRegistry::add`.
    pub fn new(peer: String, queue: mpsc::Receiver<Message>, registry: PeerRegistry) -> Self {
        Self {
            _registration: Registration {
                registry,
                peer: peer.clone(),
            },
            peer,
            queue,
            state: LinkState::Created,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Drive the link until the peer goes away or the queue is closed.
    ///
    /// Returns the number of messages written. Dropping `self` at the end
    /// releases the socket and the registry entry.
    pub async fn run(mut self) -> Result<usize, LinkError> {
        let result = self.stream().await;
        self.transition(LinkState::Closed);
        result
    }

    async fn stream(&mut self) -> Result<usize, LinkError> {
        self.transition(LinkState::Connecting);
        let mut socket = TcpStream::connect(&self.peer)
            .await
            .map_err(|source| LinkError::Connect {
                peer: self.peer.clone(),
                source,
            })?;
        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!(peer = %self.peer, error = %e, "TCP_NODELAY not set");
        }

        self.transition(LinkState::Streaming);
        tracing::info!(peer = %self.peer, "connected");

        let mut written = 0;
        while let Some(message) = self.queue.recv().await {
            let record = wire::encode(&message)?;
            socket.write_all(&record).await.map_err(LinkError::Write)?;
            written += 1;
        }

        tracing::debug!(peer = %self.peer, written, "queue closed");
        Ok(written)
    }

    fn transition(&mut self, next: LinkState) {
        tracing::trace!(peer = %self.peer, from = %self.state, to = %next, "outbound link");
        self.state = next;
    }
}
