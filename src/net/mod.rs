//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! "tcp" / "udp4" / ...
//!     → network.rs (parse name, resolve + family filter)
//!     → listener.rs (bind one Endpoint: TcpListener | UdpSocket)
//!     → accept loop (server.rs)
//!     → connection.rs (Connection<C> | Datagram, wrapped in Inbound)
//!     → Hand off to the Handler on its own task
//!
//! Outbound:
//!     dial.rs (connect, optional timeout, no retry)
//! ```
//!
//! # Design Decisions
//! - Stream vs datagram is an enum, matched exhaustively
//! - Datagram bytes are copied out of the receive buffer before dispatch
//! - Handler tasks are counted for draining, never cancelled

pub mod connection;
pub mod dial;
pub mod listener;
pub mod network;
