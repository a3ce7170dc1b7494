//! whisperd: a Whisper gossip node.
//!
//! The node floods every newly seen message to every peer it has an
//! outbound link to. Links form from an explicit peer, from discovery
//! beacons, and from reciprocal dials back to whoever sent us something.

#[cfg(feature = "redis-bridge")]
pub mod bridge;
pub mod discovery;
pub mod input;
pub mod link;
pub mod node;

pub use node::{Node, NodeError};
