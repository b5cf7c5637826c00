//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_lookups_total` (counter): lookups by outcome
//! - `relay_lookup_duration_seconds` (histogram): lookup latency including tracking
//! - `relay_tracking_forward_total` (counter): tracking calls by result
//! - `relay_spy_referrers_total` (counter): referrer verdicts
//! - `relay_spy_entries` (gauge): current blocklist size

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lookup(outcome: &'static str, start: Instant) {
    counter!("relay_lookups_total", "outcome" => outcome).increment(1);
    histogram!("relay_lookup_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_tracking_forward(result: &'static str) {
    counter!("relay_tracking_forward_total", "result" => result).increment(1);
}

pub fn record_spy_verdict(is_spy: bool) {
    let verdict = if is_spy { "spy" } else { "clean" };
    counter!("relay_spy_referrers_total", "verdict" => verdict).increment(1);
}

pub fn record_spy_entries(count: usize) {
    gauge!("relay_spy_entries").set(count as f64);
}
