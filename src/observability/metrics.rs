//! Metrics collection.
//!
//! # Metrics
//! - `liveserve_clients_connected` (gauge): currently registered clients
//! - `liveserve_broadcasts_total` (counter): fan-out rounds performed
//! - `liveserve_broadcast_fanout` (histogram): clients reached per fan-out
//!   round
//! - `liveserve_send_failures_total` (counter): clients dropped after a
//!   failed send
//! - `liveserve_change_events_total` (counter): debounced change events,
//!   labelled by extension

pub fn record_client_connected() {
    metrics::gauge!("liveserve_clients_connected").increment(1.0);
}

pub fn record_client_disconnected() {
    metrics::gauge!("liveserve_clients_connected").decrement(1.0);
}

pub fn record_broadcast(clients: usize) {
    metrics::counter!("liveserve_broadcasts_total").increment(1);
    metrics::histogram!("liveserve_broadcast_fanout").record(clients as f64);
}

pub fn record_send_failure() {
    metrics::counter!("liveserve_send_failures_total").increment(1);
}

pub fn record_change_event(extension: &str) {
    metrics::counter!("liveserve_change_events_total", "extension" => extension.to_string())
        .increment(1);
}
