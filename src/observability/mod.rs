//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener / accept loop / handler dispatch produce:
//!     → tracing events (bind, accept, transient error, close)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (address, connection_id, delay)
//! - The library never installs a subscriber or recorder
//! - Deliberate close is logged at info, never as an error

pub mod metrics;
