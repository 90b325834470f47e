use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use tokio::net::{UdpSocket, lookup_host};
use tracing::trace;

use super::DatagramSocket;

/// Resolve the host and bind an ephemeral socket of the same address family,
/// connected so that datagrams from anyone else are dropped.
pub async fn bind_connected(host: &str, port: u16) -> io::Result<UdpSocket> {
    let Some(target) = lookup_host((host, port)).await?.next() else {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{host} didn't resolve to any address"),
        ));
    };

    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    trace!("bound {:?} for {target}", socket.local_addr());
    Ok(socket)
}

impl DatagramSocket for UdpSocket {
    async fn send(&self, payload: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, payload).await
    }

    async fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buffer).await
    }
}
