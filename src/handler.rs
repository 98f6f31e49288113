//! Handler capability.

use std::future::Future;

use crate::net::connection::Inbound;

/// Consumes one accepted unit.
///
/// Called exactly once per accepted connection or received datagram, on its
/// own task. The server neither awaits nor observes the result; a handler
/// deals with its own failures.
///
/// Any `Fn(Inbound<C>) -> impl Future<Output = ()>` closure is a handler.
pub trait Handler<C>: Send + Sync + 'static {
    fn handle(&self, inbound: Inbound<C>) -> impl Future<Output = ()> + Send;
}

impl<C, F, Fut> Handler<C> for F
where
    F: Fn(Inbound<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    fn handle(&self, inbound: Inbound<C>) -> impl Future<Output = ()> + Send {
        self(inbound)
    }
}
