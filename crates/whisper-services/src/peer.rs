//! Peer registry: who this node currently has an outbound link to.
//!
//! Maps a peer's host:port to the sending half of its delivery queue.
//! The outbound link task for that peer owns the receiving half. At most
//! one entry exists per address: the first `add` wins and later callers
//! get `None`, which is how duplicate dials collapse into one link.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use whisper_core::Message;

/// Sending half of a peer's bounded delivery queue.
pub type PeerQueue = mpsc::Sender<Message>;

/// The peer registry: shared between the accept loop, discovery, and link tasks.
#[derive(Clone)]
pub struct PeerRegistry {
    peers: Arc<DashMap<String, PeerQueue>>,
    queue_depth: usize,
}

impl PeerRegistry {
    /// Create an empty registry whose queues hold `queue_depth` messages each.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            peers: Arc::new(DashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register `addr` and hand back the receiving half of its new queue.
    ///
    /// Returns `None` when `addr` is already registered (connected or
    /// connecting). Exactly one of any number of concurrent callers for the
    /// same address gets `Some`.
    pub fn add(&self, addr: &str) -> Option<mpsc::Receiver<Message>> {
        match self.peers.entry(addr.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let (tx, rx) = mpsc::channel(self.queue_depth);
                slot.insert(tx);
                Some(rx)
            }
        }
    }

    /// Drop the entry for `addr`, if any.
    ///
    /// Once every in-flight snapshot from `list` is gone this closes the
    /// queue, which ends the owning link.
    pub fn remove(&self, addr: &str) {
        self.peers.remove(addr);
    }

    /// Drop the entry for `addr` only if its receiving half is gone.
    ///
    /// Lets a closing link clean up after itself without clobbering a
    /// newer link that was registered for the same address meanwhile.
    pub fn remove_closed(&self, addr: &str) -> bool {
        self.peers.remove_if(addr, |_, tx| tx.is_closed()).is_some()
    }

    /// Snapshot of every registered queue. May be stale by the time it's used.
    pub fn list(&self) -> Vec<PeerQueue> {
        self.peers.iter().map(|e| e.value().clone()).collect()
    }

    /// Sorted snapshot of registered addresses.
    pub fn addresses(&self) -> Vec<String> {
        let mut addrs: Vec<String> = self.peers.iter().map(|e| e.key().clone()).collect();
        addrs.sort();
        addrs
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.peers.contains_key(addr)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }
}
