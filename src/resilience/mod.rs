//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop:
//!     → accept.rs (one accept / recv_from, classify the error)
//!     → transient: backoff.rs (next delay), sleep, retry
//!     → closed: end of stream
//!     → anything else: surface to serve()
//! ```
//!
//! # Design Decisions
//! - Backoff state lives in one accept call and resets for the next
//! - Every sleep is interruptible by the close signal
//! - Dialing never retries

pub mod accept;
pub mod backoff;
