//! Message codec capability.
//!
//! The server never frames bytes itself. A caller that wants structured
//! messages supplies a [`Codec`]; each accepted stream carries a shared
//! reference to it so the handler can call
//! [`Connection::read_message`](crate::Connection::read_message) and
//! [`Connection::write_message`](crate::Connection::write_message).
//!
//! Servers that only hand out raw sockets can use `()` as the codec type.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

/// Converts between a duplex byte channel and message values.
pub trait Codec: Send + Sync + 'static {
    /// The structured value carried by one frame.
    type Message: Send;

    /// Framing or I/O failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read exactly one message from `io`.
    fn read<T>(&self, io: &mut T) -> impl Future<Output = Result<Self::Message, Self::Error>> + Send
    where
        T: AsyncRead + AsyncWrite + Unpin + Send;

    /// Write exactly one message to `io`.
    fn write<T>(
        &self,
        io: &mut T,
        message: Self::Message,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send
    where
        T: AsyncRead + AsyncWrite + Unpin + Send;
}
