//! whisper-core: shared types, wire format, and configuration.
//! All other Whisper crates depend on this one.

pub mod config;
pub mod message;
pub mod wire;

pub use message::Message;
