//! Error taxonomy for listening, serving and dialing.
//!
//! # Categories
//! - Configuration: unsupported transport, invalid [`ServerConfig`](crate::config::ServerConfig).
//!   Fail fast, never retried.
//! - Transport: any `io::Error` from bind, resolution, accept, receive or connect.
//!   Passed through unchanged so callers can match on `ErrorKind`.
//! - Shutdown: [`Error::Closed`], the end-of-stream signal returned by
//!   [`Server::serve`](crate::Server::serve) after a deliberate close.
//!
//! - Misuse: [`Error::AlreadyServing`] when a second accept loop is started.
//!
//! Transient stream accept errors never show up here; they are absorbed by
//! the retry loop in [`resilience::accept`](crate::resilience::accept).
//! Datagram receive errors are not retried and surface as [`Error::Io`].

use std::io;
use std::time::Duration;

use crate::config::ConfigError;

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The network name is not one of `tcp`, `tcp4`, `tcp6`, `udp`, `udp4`, `udp6`.
    #[error("unsupported transport: {0:?}")]
    UnsupportedTransport(String),

    /// Underlying transport failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// An outbound connection was not established in time.
    #[error("dial timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint was closed; the accept loop ended on purpose.
    #[error("endpoint closed")]
    Closed,

    /// `serve` was called while the server's accept loop was already running.
    #[error("accept loop already running")]
    AlreadyServing,

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for the end-of-stream signal produced by [`Server::close`](crate::Server::close).
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// True for errors caused by caller input rather than the transport.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::UnsupportedTransport(_) | Error::Config(_))
    }

    /// True when a dial ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
