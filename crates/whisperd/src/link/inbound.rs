//! Inbound link: reads the message stream of one peer that dialed us.
//!
//! Records are decoded as they complete, whatever the read boundaries.
//! Any decode failure or EOF ends the link. Nothing is retried and the
//! failure never reaches other links.

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use whisper_core::wire::RecordDecoder;

use super::LinkError;
use crate::node::Node;

const READ_CHUNK: usize = 8 * 1024;

pub struct InboundLink {
    node: Node,
    socket: TcpStream,
    remote: SocketAddr,
}

impl InboundLink {
    pub fn new(node: Node, socket: TcpStream, remote: SocketAddr) -> Self {
        Self {
            node,
            socket,
            remote,
        }
    }

    /// Read records until the peer disconnects.
    ///
    /// Returns the number of records that were new to this node.
    pub async fn run(self) -> Result<usize, LinkError> {
        tracing::debug!(remote = %self.remote, "inbound link open");

        let InboundLink {
            node,
            mut socket,
            remote,
        } = self;
        let mut decoder = RecordDecoder::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        let mut delivered = 0;

        loop {
            let n = socket.read(&mut chunk).await.map_err(LinkError::Read)?;
            if n == 0 {
                decoder.finish()?;
                return Ok(delivered);
            }
            decoder.extend(&chunk[..n]);

            while let Some(message) = decoder.next_record()? {
                tracing::trace!(%remote, id = %message.id, "record");
                if node.receive(message) {
                    delivered += 1;
                }
            }
        }
    }
}
