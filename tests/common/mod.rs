//! Shared utilities for integration testing.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use fanout::{Codec, Handler, Server};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(2);

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fanout=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Newline-delimited UTF-8 messages.
#[allow(dead_code)]
pub struct LineCodec;

impl Codec for LineCodec {
    type Message = String;
    type Error = io::Error;

    async fn read<T>(&self, io: &mut T) -> io::Result<String>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut line = Vec::new();
        loop {
            match io.read_u8().await? {
                b'\n' => break,
                byte => line.push(byte),
            }
        }
        String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn write<T>(&self, io: &mut T, message: String) -> io::Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        io.write_all(message.as_bytes()).await?;
        io.write_all(b"\n").await?;
        io.flush().await
    }
}

/// Run `serve` on its own task.
#[allow(dead_code)]
pub fn spawn_serve<H, C>(server: &Arc<Server<H, C>>) -> JoinHandle<fanout::Result<()>>
where
    H: Handler<C>,
    C: Send + Sync + 'static,
{
    let server = Arc::clone(server);
    tokio::spawn(async move { server.serve().await })
}

/// Whether a fresh listener can take `addr` right now.
#[allow(dead_code)]
pub fn port_is_free(addr: std::net::SocketAddr) -> bool {
    std::net::TcpListener::bind(addr).is_ok()
}
