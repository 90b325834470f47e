//! In-memory sockets for tests. They count how many sockets were opened and
//! how many are open at once, and never touch the network.

use std::{
    io,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf},
    time::Instant,
};

use super::{DatagramSocket, NetworkTransport};
use crate::scanner::protocols::{bedrock, varint::write_varint};

#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Reply with these bytes after the delay.
    Respond { data: Vec<u8>, delay: Duration },
    /// Reply with these bytes a few at a time, pausing between writes.
    Trickle {
        data: Vec<u8>,
        chunk_size: usize,
        pause: Duration,
    },
    /// Accept the connection but never say anything.
    Silent,
    /// Fail to open the socket.
    Refuse,
}

impl FakeBehavior {
    pub fn respond(data: Vec<u8>) -> Self {
        FakeBehavior::Respond {
            data,
            delay: Duration::ZERO,
        }
    }
}

pub struct FakeTransport {
    behavior: Mutex<FakeBehavior>,
    refusals_left: AtomicUsize,
    /// Every call to open a socket, including refused ones.
    pub opened: AtomicUsize,
    /// Sockets that are currently open.
    pub live: Arc<AtomicUsize>,
    /// The most sockets that were ever open at the same time.
    pub max_live: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    connect_times: Mutex<Vec<Instant>>,
    /// The server side of silent connections, so they don't get closed.
    held: Mutex<Vec<DuplexStream>>,
}

impl FakeTransport {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            refusals_left: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            connect_times: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: FakeBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Refuse the next `n` sockets before going back to the normal behavior.
    pub fn fail_first(&self, n: usize) {
        self.refusals_left.store(n, Ordering::SeqCst);
    }

    /// Everything the client sent, one entry per socket.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().clone()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().clone()
    }

    /// Count the open and decide whether it should be refused.
    fn open(&self) -> io::Result<(FakeBehavior, LiveGuard)> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.connect_times.lock().push(Instant::now());

        let refuse_now = self
            .refusals_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let behavior = self.behavior.lock().clone();
        if refuse_now || matches!(behavior, FakeBehavior::Refuse) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ));
        }
        Ok((behavior, LiveGuard::new(&self.live, &self.max_live)))
    }
}

impl NetworkTransport for FakeTransport {
    type Stream = TrackedStream;
    type Datagram = FakeDatagram;

    async fn connect(&self, _host: &str, _port: u16) -> io::Result<TrackedStream> {
        let (behavior, guard) = self.open()?;
        let (client, mut server) = tokio::io::duplex(64 * 1024);

        match behavior {
            FakeBehavior::Respond { data, delay } => {
                let requests = self.requests.clone();
                tokio::spawn(async move {
                    let mut buffer = vec![0; 1024];
                    let n = server.read(&mut buffer).await.unwrap_or(0);
                    requests.lock().push(buffer[..n].to_vec());
                    tokio::time::sleep(delay).await;
                    let _ = server.write_all(&data).await;
                    // wait for the client to hang up
                    let _ = server.read(&mut buffer).await;
                });
            }
            FakeBehavior::Trickle {
                data,
                chunk_size,
                pause,
            } => {
                let requests = self.requests.clone();
                tokio::spawn(async move {
                    let mut buffer = vec![0; 1024];
                    let n = server.read(&mut buffer).await.unwrap_or(0);
                    requests.lock().push(buffer[..n].to_vec());
                    for piece in data.chunks(chunk_size.max(1)) {
                        tokio::time::sleep(pause).await;
                        if server.write_all(piece).await.is_err() {
                            return;
                        }
                    }
                    let _ = server.read(&mut buffer).await;
                });
            }
            FakeBehavior::Silent => self.held.lock().push(server),
            FakeBehavior::Refuse => unreachable!("refused in open"),
        }

        Ok(TrackedStream {
            inner: client,
            _guard: guard,
        })
    }

    async fn bind_datagram(&self, _host: &str, _port: u16) -> io::Result<FakeDatagram> {
        let (behavior, guard) = self.open()?;
        let response = match behavior {
            FakeBehavior::Respond { data, delay } => Some((data, delay)),
            _ => None,
        };
        Ok(FakeDatagram {
            response,
            requests: self.requests.clone(),
            _guard: guard,
        })
    }
}

struct LiveGuard {
    live: Arc<AtomicUsize>,
}

impl LiveGuard {
    fn new(live: &Arc<AtomicUsize>, max_live: &Arc<AtomicUsize>) -> Self {
        let now_live = live.fetch_add(1, Ordering::SeqCst) + 1;
        max_live.fetch_max(now_live, Ordering::SeqCst);
        Self { live: live.clone() }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TrackedStream {
    inner: DuplexStream,
    _guard: LiveGuard,
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

pub struct FakeDatagram {
    response: Option<(Vec<u8>, Duration)>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    _guard: LiveGuard,
}

impl DatagramSocket for FakeDatagram {
    async fn send(&self, payload: &[u8]) -> io::Result<usize> {
        self.requests.lock().push(payload.to_vec());
        Ok(payload.len())
    }

    async fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let Some((data, delay)) = &self.response else {
            return std::future::pending().await;
        };
        tokio::time::sleep(*delay).await;
        let n = data.len().min(buffer.len());
        buffer[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

/// A status response packet wrapping the json.
pub fn java_status_frame(json: &str) -> Vec<u8> {
    let mut packet = vec![0x00];
    write_varint(&mut packet, json.len() as i32);
    packet.extend_from_slice(json.as_bytes());
    let mut framed = Vec::new();
    write_varint(&mut framed, packet.len() as i32);
    framed.extend(packet);
    framed
}

/// An unconnected pong carrying the server id string.
pub fn bedrock_pong(server_id: &str) -> Vec<u8> {
    let mut datagram = vec![bedrock::UNCONNECTED_PONG_ID];
    datagram.extend_from_slice(&0u64.to_be_bytes());
    datagram.extend_from_slice(&0x1234u64.to_be_bytes());
    datagram.extend_from_slice(&bedrock::MAGIC);
    datagram.extend_from_slice(&(server_id.len() as u16).to_be_bytes());
    datagram.extend_from_slice(server_id.as_bytes());
    datagram
}
