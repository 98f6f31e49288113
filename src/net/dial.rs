//! Outbound connections.
//!
//! The mirror image of [`Endpoint::bind`](crate::net::listener::Endpoint::bind):
//! a straight pass-through to the transport's connect primitive with no retry
//! and no backoff. A failed dial is reported to the caller right away.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpStream, UdpSocket};

use crate::error::{Error, Result};
use crate::net::network::{Network, Transport};

/// An outbound connection.
#[derive(Debug)]
pub enum Conn {
    Stream(TcpStream),
    /// A datagram socket connected to a single peer.
    Datagram(UdpSocket),
}

impl Conn {
    pub fn transport(&self) -> Transport {
        match self {
            Conn::Stream(_) => Transport::Stream,
            Conn::Datagram(_) => Transport::Datagram,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Conn::Stream(stream) => stream.local_addr(),
            Conn::Datagram(socket) => socket.local_addr(),
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Conn::Stream(stream) => stream.peer_addr(),
            Conn::Datagram(socket) => socket.peer_addr(),
        }
    }

    pub fn into_stream(self) -> Option<TcpStream> {
        match self {
            Conn::Stream(stream) => Some(stream),
            Conn::Datagram(_) => None,
        }
    }

    pub fn into_socket(self) -> Option<UdpSocket> {
        match self {
            Conn::Stream(_) => None,
            Conn::Datagram(socket) => Some(socket),
        }
    }
}

/// Connect to `address` over `network`.
pub async fn dial(network: &str, address: &str) -> Result<Conn> {
    let network: Network = network.parse()?;
    connect(network, address).await
}

/// Like [`dial`], failing with [`Error::Timeout`] if the connection is not
/// established within `timeout`.
pub async fn dial_timeout(network: &str, address: &str, timeout: Duration) -> Result<Conn> {
    let network: Network = network.parse()?;
    tokio::time::timeout(timeout, connect(network, address))
        .await
        .map_err(|_| Error::Timeout(timeout))?
}

async fn connect(network: Network, address: &str) -> Result<Conn> {
    let addrs = network.resolve(address).await?;

    let mut last_err = None;
    for addr in addrs {
        let attempt = match network.transport() {
            Transport::Stream => TcpStream::connect(addr).await.map(Conn::Stream),
            Transport::Datagram => connect_datagram(addr).await.map(Conn::Datagram),
        };
        match attempt {
            Ok(conn) => {
                tracing::debug!(network = %network, address = %addr, "Dialed");
                return Ok(conn);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "could not resolve to any address"))
        .into())
}

async fn connect_datagram(peer: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if peer.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(peer).await?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_network() {
        let err = dial("ipx", "127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransport(ref name) if name == "ipx"));
    }

    #[tokio::test]
    async fn datagram_dial_is_connected() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let conn = dial("udp", &peer_addr.to_string()).await.unwrap();
        assert_eq!(conn.transport(), Transport::Datagram);
        assert_eq!(conn.peer_addr().unwrap(), peer_addr);

        let socket = conn.into_socket().unwrap();
        socket.send(b"hi").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi");
        assert_eq!(from.port(), socket.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn family_mismatch_is_invalid_input() {
        let err = dial("tcp6", "127.0.0.1:80").await.unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
