//! The sockets probes talk through.
//!
//! Probers only see these traits, so tests can swap real sockets out for
//! in-memory ones.

pub mod tcp;
pub mod udp;

#[cfg(test)]
pub mod testing;

use std::{future::Future, io};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, UdpSocket},
};

/// Opens the sockets used by the probers. Every call must hand out a brand new
/// socket, they're never shared between attempts.
pub trait NetworkTransport: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;
    type Datagram: DatagramSocket;

    /// Open a TCP connection to the host.
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;

    /// Bind a UDP socket that sends to and only receives from the host.
    fn bind_datagram(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = io::Result<Self::Datagram>> + Send;
}

pub trait DatagramSocket: Send + Sync {
    fn send(&self, payload: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;
    fn recv(&self, buffer: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Real sockets on the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTransport;

impl NetworkTransport for TokioTransport {
    type Stream = TcpStream;
    type Datagram = UdpSocket;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        tcp::connect(host, port).await
    }

    async fn bind_datagram(&self, host: &str, port: u16) -> io::Result<UdpSocket> {
        udp::bind_connected(host, port).await
    }
}
