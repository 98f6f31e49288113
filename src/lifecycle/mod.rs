//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Server::close
//!     → shutdown.rs (flip the watch channel)
//!     → accept loop wakes from accept / recv / backoff sleep
//!     → serve() returns Error::Closed
//! ```
//!
//! # Design Decisions
//! - Closing only stops accepting; dispatched handlers run to completion
//! - The signal is level-triggered so a loop started after close exits at once

pub mod shutdown;

pub use shutdown::Shutdown;
