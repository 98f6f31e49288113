//! Accepted units and handler lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Wrap an accepted stream together with the server's codec
//! - Own a private copy of each received datagram
//! - Count running handler tasks so callers can drain

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::watch;

use crate::codec::Codec;
use crate::net::network::Transport;
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an accepted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An accepted stream connection.
pub struct Connection<C> {
    id: ConnectionId,
    stream: TcpStream,
    peer_addr: SocketAddr,
    codec: Arc<C>,
}

impl<C> Connection<C> {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr, codec: Arc<C>) -> Self {
        Self {
            id: ConnectionId::new(),
            stream,
            peer_addr,
            codec,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn codec(&self) -> &Arc<C> {
        &self.codec
    }

    /// Give up the codec and return the raw stream.
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

impl<C: Codec> Connection<C> {
    /// Read one message through the server's codec.
    pub async fn read_message(&mut self) -> Result<C::Message, C::Error> {
        self.codec.read(&mut self.stream).await
    }

    /// Write one message through the server's codec.
    pub async fn write_message(&mut self, message: C::Message) -> Result<(), C::Error> {
        self.codec.write(&mut self.stream, message).await
    }
}

impl<C> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

/// A received datagram.
///
/// `data` is an owned copy of exactly the bytes that arrived; the receive
/// buffer it came from is reused for the next packet.
#[derive(Debug)]
pub struct Datagram {
    id: ConnectionId,
    data: Vec<u8>,
    peer_addr: SocketAddr,
    socket: Arc<UdpSocket>,
}

impl Datagram {
    pub(crate) fn new(data: Vec<u8>, peer_addr: SocketAddr, socket: Arc<UdpSocket>) -> Self {
        Self {
            id: ConnectionId::new(),
            data,
            peer_addr,
            socket,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Sender of the datagram.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// The server's socket, shared with the accept loop.
    pub fn socket(&self) -> &Arc<UdpSocket> {
        &self.socket
    }

    /// Send `buf` back to the sender through the server's socket.
    pub async fn reply(&self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send_to(buf, self.peer_addr).await
    }
}

/// One unit handed to a [`Handler`](crate::Handler).
#[derive(Debug)]
pub enum Inbound<C> {
    Stream(Connection<C>),
    Datagram(Datagram),
}

impl<C> Inbound<C> {
    pub fn transport(&self) -> Transport {
        match self {
            Inbound::Stream(_) => Transport::Stream,
            Inbound::Datagram(_) => Transport::Datagram,
        }
    }

    pub fn id(&self) -> ConnectionId {
        match self {
            Inbound::Stream(conn) => conn.id(),
            Inbound::Datagram(datagram) => datagram.id(),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        match self {
            Inbound::Stream(conn) => conn.peer_addr(),
            Inbound::Datagram(datagram) => datagram.peer_addr(),
        }
    }

    pub fn into_stream(self) -> Option<Connection<C>> {
        match self {
            Inbound::Stream(conn) => Some(conn),
            Inbound::Datagram(_) => None,
        }
    }

    pub fn into_datagram(self) -> Option<Datagram> {
        match self {
            Inbound::Stream(_) => None,
            Inbound::Datagram(datagram) => Some(datagram),
        }
    }
}

/// Tracks running handler tasks.
///
/// The count lives in a watch channel so [`wait_idle`](InFlight::wait_idle)
/// wakes as soon as the last guard drops.
#[derive(Debug, Clone)]
pub struct InFlight {
    count: Arc<watch::Sender<usize>>,
}

impl InFlight {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            count: Arc::new(tx),
        }
    }

    /// Record a new running handler. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.count.send_modify(|n| *n += 1);
        metrics::handler_started();
        InFlightGuard {
            count: Arc::clone(&self.count),
        }
    }

    /// Get current running handler count.
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until no handler is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard held by a handler task for its whole run, including unwinding.
#[derive(Debug)]
pub struct InFlightGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n -= 1);
        metrics::handler_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
        assert_eq!(id1.to_string(), format!("conn-{}", id1.as_u64()));
    }

    #[test]
    fn in_flight_counts() {
        let tracker = InFlight::new();
        assert_eq!(tracker.count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.count(), 2);

        drop(guard1);
        assert_eq!(tracker.count(), 1);

        drop(guard2);
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_wakes_on_last_guard() {
        let tracker = InFlight::new();
        let guard = tracker.track();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should return once idle")
            .unwrap();
    }

    #[tokio::test]
    async fn guard_released_when_task_panics() {
        let tracker = InFlight::new();
        let guard = tracker.track();

        let task = tokio::spawn(async move {
            let _guard = guard;
            panic!("handler failed");
        });
        assert!(task.await.unwrap_err().is_panic());
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn datagram_reply_reaches_sender() {
        let server = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        let datagram = Datagram::new(b"ping".to_vec(), client_addr, Arc::clone(&server));
        assert_eq!(datagram.data(), b"ping");
        datagram.reply(b"pong").await.unwrap();

        let mut buf = [0u8; 16];
        let (n, from) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
        assert_eq!(from, server.local_addr().unwrap());
    }
}
