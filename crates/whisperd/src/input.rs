//! Local input source: operator-composed messages from a line reader.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::node::Node;

/// Originate one message per non-empty line read from `reader`.
///
/// Returns the number of messages originated once the reader hits EOF.
pub async fn read_input<R>(node: Node, reader: R) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message = node.originate(line);
        tracing::debug!(id = %message.id, peers = node.registry().len(), "message sent");
        sent += 1;
    }

    Ok(sent)
}
