//! Accepting one unit, with or without transient-error retry.
//!
//! # State Machine
//! ```text
//! accept_or_close:
//!     accept()
//!         Ok            → return unit
//!         closed        → return Error::Closed
//!         anything else → return Error::Io(e)
//!
//! accept_with_retry:
//!     delay = 0
//!     loop:
//!         accept_or_close()
//!             Io(transient) → delay = delay == 0 ? initial : min(2 * delay, max)
//!                             sleep(delay), retry
//!             anything else → return it
//! ```
//!
//! Stream listeners use the retrying form; datagram sockets stop on the
//! first receive error. The delay is local to one call: every accepted unit
//! starts again from zero. A close signal interrupts both the pending accept
//! and the sleep.

use std::future::Future;
use std::io;

use tokio::sync::watch;

use crate::config::BackoffConfig;
use crate::error::Error;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

/// A source of inbound units: a stream listener or a datagram socket.
pub trait Acceptor {
    type Unit;

    /// Wait for the next unit.
    fn accept(&mut self) -> impl Future<Output = io::Result<Self::Unit>> + Send;
}

/// Errors that are expected to clear on their own.
///
/// Per-connection failures (the peer went away between SYN and accept) and
/// resource exhaustion such as `EMFILE`/`ENFILE`. Retrying these in a tight
/// loop would spin, hence the backoff.
pub fn is_transient(e: &io::Error) -> bool {
    if matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::OutOfMemory
    ) {
        return true;
    }

    #[cfg(unix)]
    {
        use nix::errno::Errno;

        if let Some(code) = e.raw_os_error() {
            return [Errno::EMFILE, Errno::ENFILE, Errno::ENOBUFS, Errno::ENOMEM]
                .iter()
                .any(|errno| *errno as i32 == code);
        }
    }

    false
}

/// The OS reports the endpoint descriptor no longer exists.
pub fn is_closed(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(nix::errno::Errno::EBADF as i32) {
            return true;
        }
    }
    e.kind() == io::ErrorKind::NotConnected
}

/// Accept one unit without retrying.
///
/// A close, either through the signal or reported by the OS, becomes
/// [`Error::Closed`]. Every other failure is returned unchanged.
pub async fn accept_or_close<A: Acceptor>(
    acceptor: &mut A,
    closed: &mut watch::Receiver<bool>,
) -> Result<A::Unit, Error> {
    let result = tokio::select! {
        biased;
        _ = shutdown::triggered(closed) => return Err(Error::Closed),
        result = acceptor.accept() => result,
    };

    match result {
        Ok(unit) => Ok(unit),
        Err(e) if is_closed(&e) => {
            tracing::debug!(error = %e, "Endpoint gone, ending accept");
            Err(Error::Closed)
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Accept one unit, retrying transient failures with exponential backoff.
pub async fn accept_with_retry<A: Acceptor>(
    acceptor: &mut A,
    closed: &mut watch::Receiver<bool>,
    config: &BackoffConfig,
) -> Result<A::Unit, Error> {
    let mut backoff = Backoff::from_config(config);

    loop {
        let e = match accept_or_close(acceptor, closed).await {
            Err(Error::Io(e)) if is_transient(&e) => e,
            other => return other,
        };

        let delay = backoff.next_delay();
        tracing::warn!(
            error = %e,
            delay = ?delay,
            attempt = backoff.attempts(),
            "Transient accept error, retrying"
        );
        metrics::record_transient_error();

        tokio::select! {
            biased;
            _ = shutdown::triggered(closed) => return Err(Error::Closed),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
