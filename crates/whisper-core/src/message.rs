//! The unit of propagation.
//!
//! A message is built once by the node that originates it and then only
//! ever cloned as it floods through the mesh.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Length in bytes of a freshly generated message id, before hex encoding.
pub const ID_LEN: usize = 16;

/// A message flooding through the mesh.
///
/// Field names on the wire are capitalised so this node can join an
/// existing whisper network. Those nodes write the nickname under the key
/// `omitempty`, which is accepted on read. Key matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Random token used only to suppress re-broadcast. Not an ordering key.
    #[serde(rename = "ID")]
    pub id: String,

    /// host:port the originating node is listening on.
    #[serde(rename = "Addr")]
    pub addr: String,

    #[serde(rename = "Body", default)]
    pub body: String,

    /// Optional display label. Empty falls back to `addr`.
    #[serde(
        rename = "Nick",
        alias = "omitempty",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub nick: String,

    /// Unix seconds at origination, 0 when the sender didn't stamp one.
    #[serde(rename = "Timestamp", default, skip_serializing_if = "is_zero")]
    pub timestamp: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Message {
    /// Build a new message originated by the node listening on `addr`.
    pub fn originate(addr: impl Into<String>, body: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            id: random_id(),
            addr: addr.into(),
            body: body.into(),
            nick: nick.into(),
            timestamp: unix_now(),
        }
    }

    /// Label to show next to the body: the nickname, or the origin address.
    pub fn display_name(&self) -> &str {
        if self.nick.is_empty() {
            &self.addr
        } else {
            &self.nick
        }
    }
}

/// Generate a fresh hex-encoded random message id.
pub fn random_id() -> String {
    hex::encode(rand::random::<[u8; ID_LEN]>())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
