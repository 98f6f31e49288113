//! Transport-agnostic connection acceptance.
//!
//! Bind one endpoint (stream or datagram), accept inbound units in a single
//! sequential loop and hand each one to a user-supplied [`Handler`] on its
//! own task.
//!
//! ```no_run
//! use fanout::Inbound;
//!
//! # async fn run() -> fanout::Result<()> {
//! let server = fanout::listen("tcp", "127.0.0.1:7000", (), |inbound: Inbound<()>| async move {
//!     if let Some(conn) = inbound.into_stream() {
//!         tracing::info!(peer = %conn.peer_addr(), "hello");
//!     }
//! })
//! .await?;
//!
//! match server.serve().await {
//!     Err(e) if e.is_closed() => Ok(()),
//!     other => other,
//! }
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod server;

pub use codec::Codec;
pub use config::schema::ServerConfig;
pub use error::{Error, Result};
pub use handler::Handler;
pub use lifecycle::Shutdown;
pub use net::connection::{Connection, ConnectionId, Datagram, Inbound};
pub use net::dial::{dial, dial_timeout, Conn};
pub use net::listener::Endpoint;
pub use net::network::{Network, Transport};
pub use server::{listen, Server};
