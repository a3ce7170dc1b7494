//! Peer links.
//!
//! Every socket carries messages in one direction only. An outbound link
//! writes to a peer we dialed; an inbound link reads from a peer that
//! dialed us. A pair of nodes that talk both ways holds two sockets.

pub mod inbound;
pub mod outbound;

use std::fmt;

use whisper_core::wire::WireError;

pub use inbound::InboundLink;
pub use outbound::OutboundLink;

/// Lifecycle of an outbound link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Queue registered, no socket yet.
    Created,
    Connecting,
    /// Draining the queue onto the socket.
    Streaming,
    /// Terminal. Socket released, registry entry removed.
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Created => "created",
            LinkState::Connecting => "connecting",
            LinkState::Streaming => "streaming",
            LinkState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        source: std::io::Error,
    },
    #[error("write failed: {0}")]
    Write(std::io::Error),
    #[error("read failed: {0}")]
    Read(std::io::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
}
