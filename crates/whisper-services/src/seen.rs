//! Deduplication cache: the network's flood-suppression memory.
//!
//! Every message id this node has processed is recorded here. A node
//! forwards a message only the first time its id is marked, which is what
//! stops a flood from cycling forever around loops in the mesh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Set of processed message ids, with first-sight time kept for optional expiry.
#[derive(Clone, Default)]
pub struct SeenCache {
    ids: Arc<DashMap<String, Instant>>,
}

impl SeenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` and report whether it had already been recorded.
    ///
    /// Returns `false` exactly once per id (the first caller wins, even
    /// under concurrent calls) and `true` for every later call.
    pub fn check_and_mark(&self, id: &str) -> bool {
        if self.ids.contains_key(id) {
            return true;
        }
        match self.ids.entry(id.to_string()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget ids first seen more than `ttl` ago. Returns how many were dropped.
    pub fn expire(&self, ttl: Duration) -> usize {
        let before = self.ids.len();
        self.ids.retain(|_, first_seen| first_seen.elapsed() < ttl);
        before.saturating_sub(self.ids.len())
    }

    /// Periodically expire ids older than `ttl`.
    ///
    /// Runs forever. Cancel by dropping the task handle. Only spawned when
    /// a retention window is configured; otherwise ids live for the process.
    pub async fn expiry_loop(self, ttl: Duration) {
        let check_interval = (ttl / 4).max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(check_interval);

        loop {
            interval.tick().await;
            let removed = self.expire(ttl);
            if removed > 0 {
                tracing::debug!(removed, remaining = self.len(), "expired seen message ids");
            }
        }
    }
}
