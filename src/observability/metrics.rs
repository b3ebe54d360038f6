//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_attempts_total` (counter): attempts by candidate, outcome
//! - `gateway_attempt_duration_seconds` (histogram): per-attempt latency by candidate
//! - `gateway_failovers_total` (counter): requests satisfied by a backup, by candidate
//! - `gateway_exhausted_total` (counter): requests answered with the fixed 503
//!
//! Recording is a no-op until a recorder is installed, so the failover
//! core records unconditionally.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_attempt(candidate: &str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "gateway_attempts_total",
        "candidate" => candidate.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_attempt_duration_seconds", "candidate" => candidate.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_failover(candidate: &str) {
    counter!("gateway_failovers_total", "candidate" => candidate.to_string()).increment(1);
}

pub fn record_exhausted() {
    counter!("gateway_exhausted_total").increment(1);
}
