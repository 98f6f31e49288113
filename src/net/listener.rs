//! Endpoint binding.
//!
//! # Responsibilities
//! - Resolve the configured address for the requested network
//! - Bind exactly one stream listener or datagram socket
//! - Expose the bound resource to the accept loop as an [`Acceptor`]

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream, UdpSocket};

use crate::net::connection::Datagram;
use crate::net::network::{Network, Transport};
use crate::resilience::accept::Acceptor;

/// A bound network resource owned by one server.
#[derive(Debug)]
pub enum Endpoint {
    /// Listening stream socket.
    Stream(TcpListener),
    /// Bound datagram socket, shared with datagram handlers for replies.
    Datagram(Arc<UdpSocket>),
}

impl Endpoint {
    /// Bind to `address` using the transport of `network`.
    ///
    /// Every resolved address is tried in order; the error of the last
    /// attempt is returned unchanged if none binds.
    pub async fn bind(network: Network, address: &str) -> io::Result<Self> {
        let addrs = network.resolve(address).await?;

        let mut last_err = None;
        for addr in addrs {
            let bound = match network.transport() {
                Transport::Stream => TcpListener::bind(addr).await.map(Endpoint::Stream),
                Transport::Datagram => UdpSocket::bind(addr)
                    .await
                    .map(|socket| Endpoint::Datagram(Arc::new(socket))),
            };
            match bound {
                Ok(endpoint) => return Ok(endpoint),
                Err(e) => {
                    tracing::debug!(address = %addr, error = %e, "Bind attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "could not resolve to any address")
        }))
    }

    pub fn transport(&self) -> Transport {
        match self {
            Endpoint::Stream(_) => Transport::Stream,
            Endpoint::Datagram(_) => Transport::Datagram,
        }
    }

    /// Get the local address this endpoint is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Endpoint::Stream(listener) => listener.local_addr(),
            Endpoint::Datagram(socket) => socket.local_addr(),
        }
    }

    pub fn as_listener(&self) -> Option<&TcpListener> {
        match self {
            Endpoint::Stream(listener) => Some(listener),
            Endpoint::Datagram(_) => None,
        }
    }

    pub fn as_socket(&self) -> Option<&Arc<UdpSocket>> {
        match self {
            Endpoint::Stream(_) => None,
            Endpoint::Datagram(socket) => Some(socket),
        }
    }
}

/// Accepts connections from a stream listener.
pub(crate) struct StreamAcceptor<'a> {
    listener: &'a TcpListener,
}

impl<'a> StreamAcceptor<'a> {
    pub(crate) fn new(listener: &'a TcpListener) -> Self {
        Self { listener }
    }
}

impl Acceptor for StreamAcceptor<'_> {
    type Unit = (TcpStream, SocketAddr);

    async fn accept(&mut self) -> io::Result<Self::Unit> {
        self.listener.accept().await
    }
}

/// Receives datagrams into one reusable buffer and copies each out.
pub(crate) struct DatagramAcceptor {
    socket: Arc<UdpSocket>,
    buf: Vec<u8>,
}

impl DatagramAcceptor {
    pub(crate) fn new(socket: Arc<UdpSocket>, buffer_size: usize) -> Self {
        Self {
            socket,
            buf: vec![0; buffer_size],
        }
    }
}

impl Acceptor for DatagramAcceptor {
    type Unit = Datagram;

    async fn accept(&mut self) -> io::Result<Datagram> {
        let (len, peer_addr) = self.socket.recv_from(&mut self.buf).await?;
        // The buffer is overwritten by the next recv.
        let data = self.buf[..len].to_vec();
        Ok(Datagram::new(data, peer_addr, Arc::clone(&self.socket)))
    }
}
