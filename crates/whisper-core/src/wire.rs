//! Wire format.
//!
//! Peer links carry a stream of JSON `Message` objects. Each object is
//! self-delimiting, so records may arrive back to back, split across
//! reads, or separated by whitespace. We write a newline after each
//! record; readers never depend on it.
//!
//! Discovery datagrams carry the sender's listening address as plain text.

use crate::message::Message;

/// Default TCP port a node listens on for peer links.
pub const DEFAULT_LISTEN_PORT: u16 = 55555;

/// Well-known UDP port for discovery beacons.
pub const DISCOVERY_PORT: u16 = 5555;

/// Default destination for the one-shot discovery beacon.
pub const DISCOVERY_BROADCAST: &str = "255.255.255.255";

/// Largest discovery datagram we bother reading.
pub const MAX_ANNOUNCEMENT_LEN: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
    #[error("malformed record: {0}")]
    Decode(serde_json::Error),
    #[error("stream ended inside a record ({pending} bytes pending)")]
    Truncated { pending: usize },
}

/// Serialize a message into one wire record, trailing newline included.
pub fn encode(message: &Message) -> Result<Vec<u8>, WireError> {
    let mut buf = serde_json::to_vec(message).map_err(WireError::Encode)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Parse one wire record. Surrounding whitespace is ignored.
pub fn decode(line: &str) -> Result<Message, WireError> {
    serde_json::from_str(line.trim()).map_err(WireError::Decode)
}

/// Incremental decoder for the record stream of one peer link.
///
/// Bytes are appended as they arrive; `next_record` yields every complete
/// record and keeps an incomplete tail for the next read.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buf: Vec<u8>,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the socket.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete record, or `None` until more bytes arrive.
    pub fn next_record(&mut self) -> Result<Option<Message>, WireError> {
        let (next, used) = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.buf).into_iter::<Message>();
            let next = stream.next();
            (next, stream.byte_offset())
        };
        match next {
            Some(Ok(message)) => {
                self.buf.drain(..used);
                Ok(Some(message))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(WireError::Decode(e)),
            // Only whitespace left.
            None => {
                self.buf.clear();
                Ok(None)
            }
        }
    }

    /// Check the stream ended on a record boundary.
    pub fn finish(&self) -> Result<(), WireError> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(WireError::Truncated {
                pending: self.buf.len(),
            })
        }
    }
}

/// Build a discovery datagram announcing `listen_addr`.
pub fn encode_announcement(listen_addr: &str) -> Vec<u8> {
    listen_addr.as_bytes().to_vec()
}

/// Extract the candidate peer address from a discovery datagram.
///
/// Returns `None` for empty or non-UTF-8 payloads.
pub fn decode_announcement(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
