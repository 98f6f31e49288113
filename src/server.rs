//! Server: one bound endpoint, one accept loop, one handler.
//!
//! # Responsibilities
//! - Bind the endpoint (`listen`)
//! - Accept connections / receive datagrams sequentially (`serve`), with at
//!   most one loop per server
//! - Spawn the handler for every unit without waiting for it
//! - Stop on `close`, reporting [`Error::Closed`]
//!
//! # Concurrency
//! ```text
//! serve():  admit → accept → spawn(handler) → admit → ...
//!                              │
//!                              └─ runs independently, may outlive serve()
//!           stream accept retries transient errors; a datagram receive error ends serve()
//! close():  flip shutdown signal, drop the server's endpoint reference
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::lifecycle::{shutdown, Shutdown};
use crate::net::connection::{Connection, InFlight, Inbound};
use crate::net::listener::{DatagramAcceptor, Endpoint, StreamAcceptor};
use crate::net::network::{Network, Transport};
use crate::observability::metrics;
use crate::resilience::accept::{accept_or_close, accept_with_retry};

/// Bind `address` on the network named by `network` (`"tcp"`, `"udp"`, ...).
///
/// The name is checked before anything is resolved or bound, so an
/// unsupported transport leaves no resource behind.
pub async fn listen<H, C>(network: &str, address: &str, codec: C, handler: H) -> Result<Server<H, C>>
where
    H: Handler<C>,
    C: Send + Sync + 'static,
{
    let network: Network = network.parse()?;
    Server::listen(network, address, codec, handler).await
}

/// A bound endpoint plus the capabilities used to serve it.
pub struct Server<H, C> {
    network: Network,
    local_addr: SocketAddr,
    endpoint: ArcSwapOption<Endpoint>,
    codec: Arc<C>,
    handler: Arc<H>,
    config: ServerConfig,
    shutdown: Shutdown,
    in_flight: InFlight,
    admission: Option<Arc<Semaphore>>,
    serving: AtomicBool,
}

/// Marks the single running accept loop; cleared when the loop exits.
struct ServingGuard<'a>(&'a AtomicBool);

impl Drop for ServingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<H, C> Server<H, C>
where
    H: Handler<C>,
    C: Send + Sync + 'static,
{
    /// Bind with the default [`ServerConfig`].
    pub async fn listen(network: Network, address: &str, codec: C, handler: H) -> Result<Self> {
        Self::listen_with_config(network, address, codec, handler, ServerConfig::default()).await
    }

    /// Bind with an explicit configuration.
    ///
    /// Bind and resolution errors are returned unchanged as [`Error::Io`].
    pub async fn listen_with_config(
        network: Network,
        address: &str,
        codec: C,
        handler: H,
        config: ServerConfig,
    ) -> Result<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let endpoint = Endpoint::bind(network, address).await?;
        let local_addr = endpoint.local_addr()?;

        tracing::info!(
            network = %network,
            address = %local_addr,
            max_in_flight = ?config.max_in_flight,
            "Endpoint bound"
        );

        Ok(Self {
            network,
            local_addr,
            endpoint: ArcSwapOption::from_pointee(endpoint),
            codec: Arc::new(codec),
            handler: Arc::new(handler),
            admission: config.max_in_flight.map(|n| Arc::new(Semaphore::new(n))),
            config,
            shutdown: Shutdown::new(),
            in_flight: InFlight::new(),
            serving: AtomicBool::new(false),
        })
    }

    /// Run the accept loop until the server is closed or a fatal error occurs.
    ///
    /// Returns [`Error::Closed`] after [`close`](Server::close), including when
    /// called on an already-closed server. Only one loop runs per server: a
    /// call made while another is running fails with [`Error::AlreadyServing`].
    /// Any other error is a transport fault; restarting is up to the caller.
    pub async fn serve(&self) -> Result<()> {
        let mut closed = self.shutdown.subscribe();
        let Some(endpoint) = self.endpoint.load_full() else {
            return Err(Error::Closed);
        };

        if self
            .serving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(address = %self.local_addr, "Accept loop already running");
            return Err(Error::AlreadyServing);
        }
        let _serving = ServingGuard(&self.serving);

        let result = match &*endpoint {
            Endpoint::Stream(listener) => self.serve_stream(listener, &mut closed).await,
            Endpoint::Datagram(socket) => self.serve_datagram(socket, &mut closed).await,
        };

        match &result {
            Err(Error::Closed) => {
                tracing::info!(address = %self.local_addr, "Accept loop stopped")
            }
            Err(e) => tracing::error!(address = %self.local_addr, error = %e, "Accept loop failed"),
            Ok(()) => {}
        }
        result
    }

    async fn serve_stream(&self, listener: &TcpListener, closed: &mut watch::Receiver<bool>) -> Result<()> {
        let mut acceptor = StreamAcceptor::new(listener);

        loop {
            let permit = self.admit(closed).await?;
            let (stream, peer_addr) = accept_with_retry(&mut acceptor, closed, &self.config.backoff).await?;

            if let Err(e) = stream.set_nodelay(self.config.tcp_nodelay) {
                tracing::trace!(error = %e, "error trying to set TCP nodelay");
            }

            let connection = Connection::new(stream, peer_addr, Arc::clone(&self.codec));
            tracing::debug!(
                connection_id = %connection.id(),
                peer_addr = %peer_addr,
                "Connection accepted"
            );
            self.dispatch(Inbound::Stream(connection), permit);
        }
    }

    async fn serve_datagram(&self, socket: &Arc<UdpSocket>, closed: &mut watch::Receiver<bool>) -> Result<()> {
        let mut acceptor = DatagramAcceptor::new(Arc::clone(socket), self.config.recv_buffer_size);

        loop {
            let permit = self.admit(closed).await?;
            // Receive errors end the loop; there is no retry on this path.
            let datagram = accept_or_close(&mut acceptor, closed).await?;

            tracing::debug!(
                connection_id = %datagram.id(),
                peer_addr = %datagram.peer_addr(),
                len = datagram.data().len(),
                "Datagram received"
            );
            self.dispatch(Inbound::Datagram(datagram), permit);
        }
    }

    /// Wait for a handler slot when admission control is configured.
    async fn admit(&self, closed: &mut watch::Receiver<bool>) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(limit) = &self.admission else {
            return Ok(None);
        };

        tokio::select! {
            biased;
            _ = shutdown::triggered(closed) => Err(Error::Closed),
            permit = Arc::clone(limit).acquire_owned() => {
                permit.map(Some).map_err(|_| Error::Closed)
            }
        }
    }

    /// Spawn the handler for one unit. The join handle is dropped on purpose.
    fn dispatch(&self, inbound: Inbound<C>, permit: Option<OwnedSemaphorePermit>) {
        metrics::record_accepted(inbound.transport());

        let span = tracing::debug_span!(
            "handler",
            connection_id = %inbound.id(),
            transport = %inbound.transport(),
        );
        let handler = Arc::clone(&self.handler);
        let guard = self.in_flight.track();

        tokio::spawn(
            async move {
                let _guard = guard;
                let _permit = permit;
                handler.handle(inbound).await;
            }
            .instrument(span),
        );
    }
}

impl<H, C> Server<H, C> {
    /// Stop accepting and release the endpoint.
    ///
    /// Safe to call concurrently with [`serve`](Server::serve), which then
    /// returns [`Error::Closed`]. Running handlers are left alone. Returns
    /// `false` if the server was already closed; a repeated close is otherwise
    /// a no-op.
    pub fn close(&self) -> bool {
        self.shutdown.trigger();

        match self.endpoint.swap(None) {
            Some(_) => {
                tracing::info!(address = %self.local_addr, "Closing endpoint");
                true
            }
            None => {
                tracing::debug!(address = %self.local_addr, "Endpoint already closed");
                false
            }
        }
    }

    /// Whether [`close`](Server::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// The network the endpoint was bound on.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Stream or datagram, derived from [`network`](Server::network).
    pub fn transport(&self) -> Transport {
        self.network.transport()
    }

    /// Address the endpoint was bound to. Still reported after close.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The bound endpoint, or `None` once closed.
    pub fn endpoint(&self) -> Option<Arc<Endpoint>> {
        self.endpoint.load_full()
    }

    /// The datagram socket, for datagram servers that are still open.
    pub fn datagram_socket(&self) -> Option<Arc<UdpSocket>> {
        self.endpoint().and_then(|endpoint| endpoint.as_socket().cloned())
    }

    /// The codec shared with every accepted stream.
    pub fn codec(&self) -> &Arc<C> {
        &self.codec
    }

    /// The validated configuration this server was bound with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of handler tasks still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Wait until every dispatched handler has finished.
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await
    }
}

impl<H, C> std::fmt::Debug for Server<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("network", &self.network)
            .field("local_addr", &self.local_addr)
            .field("closed", &self.is_closed())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
