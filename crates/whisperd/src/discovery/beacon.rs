//! One-shot discovery beacon.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use whisper_core::wire::encode_announcement;

/// Announce `self_addr` to `target` with a single datagram.
///
/// `target` is either a full host:port or a bare host, in which case
/// `default_port` is used. Fire-and-forget: no acknowledgement, no retry.
pub async fn send_beacon(self_addr: &str, target: &str, default_port: u16) -> Result<()> {
    let dest = match target.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => tokio::net::lookup_host((target, default_port))
            .await
            .with_context(|| format!("failed to resolve {target}:{default_port}"))?
            .find(SocketAddr::is_ipv4)
            .with_context(|| format!("no IPv4 address for {target}"))?,
    };

    let socket = make_broadcast_socket().context("failed to create beacon socket")?;
    let socket = UdpSocket::from_std(socket).context("failed to convert to tokio UdpSocket")?;

    let sent = socket
        .send_to(&encode_announcement(self_addr), dest)
        .await
        .with_context(|| format!("send_to {dest}"))?;

    tracing::info!(%dest, bytes = sent, "sent discovery beacon");
    Ok(())
}

/// Create a UDP socket allowed to send to broadcast addresses.
fn make_broadcast_socket() -> Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket.set_broadcast(true).context("SO_BROADCAST")?;
    socket.set_nonblocking(true).context("set_nonblocking")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket.bind(&bind_addr.into()).context("bind()")?;

    Ok(socket.into())
}
