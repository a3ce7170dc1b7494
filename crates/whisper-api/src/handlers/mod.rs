//! HTTP handlers: expose node state as JSON and accept composed messages.

pub mod compose;
pub mod peers;

use std::sync::Arc;

use whisper_core::Message;
use whisper_services::PeerRegistry;

/// Something that can originate a message on behalf of this node.
///
/// Implemented by the daemon's node handle; kept as a trait so this crate
/// doesn't depend on the daemon.
pub trait Originator: Send + Sync {
    fn originate(&self, body: String) -> Message;
}

#[derive(Clone)]
pub struct ApiState {
    pub registry: PeerRegistry,
    pub originator: Arc<dyn Originator>,
}

pub use compose::{handle_index, handle_send};
pub use peers::handle_peers;
