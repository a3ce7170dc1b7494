//! Best-effort fan-out to every registered peer.

use whisper_core::Message;

use crate::peer::PeerRegistry;

/// Enqueues messages onto every peer's delivery queue without ever waiting.
#[derive(Clone)]
pub struct Broadcaster {
    registry: PeerRegistry,
}

impl Broadcaster {
    pub fn new(registry: PeerRegistry) -> Self {
        Self { registry }
    }

    /// Offer `message` to every registered peer.
    ///
    /// A full or closed queue drops the message for that peer only. The
    /// mesh usually re-delivers it over another path. Returns how many
    /// queues accepted it.
    pub fn broadcast(&self, message: &Message) -> usize {
        let queues = self.registry.list();
        let total = queues.len();
        let accepted = queues
            .iter()
            .filter(|queue| queue.try_send(message.clone()).is_ok())
            .count();

        tracing::trace!(
            id = %message.id,
            accepted,
            dropped = total - accepted,
            "broadcast"
        );
        accepted
    }
}
