//! Discovery listener.
//!
//! Binds the discovery port and dials every address announced to it.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddrV4};

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use whisper_core::wire::{decode_announcement, MAX_ANNOUNCEMENT_LEN};

use crate::node::Node;

/// Bind the discovery port on all IPv4 interfaces.
///
/// Returns `Ok(None)` when another local process already holds the port.
/// The socket is deliberately not SO_REUSEADDR, so that case is detected.
pub fn bind(port: u16) -> Result<Option<UdpSocket>> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;
    socket.set_nonblocking(true).context("set_nonblocking")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    match socket.bind(&bind_addr.into()) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            tracing::warn!(port, "UDP discovery port already in use, inbound discovery disabled");
            return Ok(None);
        }
        Err(e) => return Err(e).context("bind()"),
    }

    let socket = UdpSocket::from_std(socket.into()).context("failed to convert to tokio UdpSocket")?;
    Ok(Some(socket))
}

/// Dial every peer announced on `socket`.
///
/// Runs forever. Cancel by dropping the task handle.
pub async fn listener_loop(socket: UdpSocket, node: Node) {
    let mut buf = vec![0u8; MAX_ANNOUNCEMENT_LEN];

    tracing::info!(addr = ?socket.local_addr().ok(), "discovery listener starting");

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "recv_from failed");
                continue;
            }
        };

        let Some(peer) = decode_announcement(&buf[..len]) else {
            tracing::trace!(%from, "ignoring empty discovery datagram");
            continue;
        };
        if peer == node.self_addr() {
            tracing::trace!("ignoring own beacon");
            continue;
        }

        tracing::info!(peer = %peer, %from, "discovered peer");
        node.dial(&peer);
    }
}
