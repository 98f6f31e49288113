//! Network names and address resolution.
//!
//! A [`Network`] names both the transport (stream or datagram) and an
//! optional IP family restriction, using the familiar `tcp`/`udp` names with
//! `4`/`6` suffixes.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;

use tokio::net::lookup_host;

use crate::error::Error;

/// Shape of the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Connection-oriented byte stream (TCP).
    Stream,
    /// Packet-oriented datagrams (UDP).
    Datagram,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Stream => "stream",
            Transport::Datagram => "datagram",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported network name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
}

impl Network {
    pub fn transport(self) -> Transport {
        match self {
            Network::Tcp | Network::Tcp4 | Network::Tcp6 => Transport::Stream,
            Network::Udp | Network::Udp4 | Network::Udp6 => Transport::Datagram,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
        }
    }

    /// Whether `addr` belongs to the IP family this network allows.
    pub fn admits(self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp | Network::Udp => true,
            Network::Tcp4 | Network::Udp4 => addr.is_ipv4(),
            Network::Tcp6 | Network::Udp6 => addr.is_ipv6(),
        }
    }

    /// Resolve `address` (`host:port`) to the socket addresses this network admits.
    ///
    /// Resolution failures are returned as-is. An empty result after family
    /// filtering is an `InvalidInput` error.
    pub async fn resolve(self, address: &str) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = lookup_host(address)
            .await?
            .filter(|addr| self.admits(addr))
            .collect();

        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no {} addresses for {:?}", self, address),
            ));
        }
        Ok(addrs)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            other => Err(Error::UnsupportedTransport(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
