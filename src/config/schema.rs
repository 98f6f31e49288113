//! Configuration schema definitions.
//!
//! All types derive Serde traits so a server can be tuned from a TOML file.
//! Every field has a default; an empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size of the datagram receive buffer when none is configured.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 10 * 1024;

/// Tuning knobs for a [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bytes reserved for one datagram read. Larger packets are truncated by the OS.
    pub recv_buffer_size: usize,

    /// Value of `TCP_NODELAY` applied to accepted streams.
    pub tcp_nodelay: bool,

    /// Upper bound on concurrently running handlers. `None` means unbounded.
    pub max_in_flight: Option<usize>,

    /// Retry delays for transient accept errors.
    pub backoff: BackoffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            tcp_nodelay: false,
            max_in_flight: None,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Exponential backoff applied between accept retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first transient failure.
    pub initial_ms: u64,

    /// Ceiling for the doubled delay.
    pub max_ms: u64,
}

impl BackoffConfig {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 5,
            max_ms: 1_000,
        }
    }
}
