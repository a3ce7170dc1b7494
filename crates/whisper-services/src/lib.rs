//! whisper-services: the shared state objects every node task works through.
//!
//! Each type here is a cheap `Clone` handle around internally
//! synchronized state, so several nodes can live in one process.

pub mod broadcast;
pub mod peer;
pub mod seen;

pub use broadcast::Broadcaster;
pub use peer::{PeerQueue, PeerRegistry};
pub use seen::SeenCache;
