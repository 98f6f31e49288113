//! Metrics collection.
//!
//! # Metrics
//! - `fanout_accepted_total` (counter): inbound units dispatched, by transport
//! - `fanout_transient_errors_total` (counter): accept/receive errors that were retried
//! - `fanout_handlers_in_flight` (gauge): handler tasks currently running
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the embedding application
//!   installs whichever recorder/exporter it wants
//! - Without a recorder every call is a no-op

use crate::net::network::Transport;

pub const ACCEPTED_TOTAL: &str = "fanout_accepted_total";
pub const TRANSIENT_ERRORS_TOTAL: &str = "fanout_transient_errors_total";
pub const HANDLERS_IN_FLIGHT: &str = "fanout_handlers_in_flight";

/// Register descriptions with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(ACCEPTED_TOTAL, "Inbound connections and datagrams dispatched to the handler");
    metrics::describe_counter!(TRANSIENT_ERRORS_TOTAL, "Transient accept errors retried with backoff");
    metrics::describe_gauge!(HANDLERS_IN_FLIGHT, "Handler tasks currently running");
}

pub fn record_accepted(transport: Transport) {
    metrics::counter!(ACCEPTED_TOTAL, "transport" => transport.as_str()).increment(1);
}

pub fn record_transient_error() {
    metrics::counter!(TRANSIENT_ERRORS_TOTAL).increment(1);
}

pub fn handler_started() {
    metrics::gauge!(HANDLERS_IN_FLIGHT).increment(1.0);
}

pub fn handler_finished() {
    metrics::gauge!(HANDLERS_IN_FLIGHT).decrement(1.0);
}
