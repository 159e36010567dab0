//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_http_requests_total` (counter): requests by method, route, status
//! - `gateway_http_request_duration_seconds` (histogram): latency distribution
//! - `gateway_gremlin_submissions_total` (counter): submissions by outcome
//! - `gateway_gremlin_retries_total` (counter): retry attempts after a disconnect
//! - `gateway_gremlin_reconnects_total` (counter): upstream handles replaced
//! - `gateway_upstream_connected` (gauge): 1=connected, 0=otherwise

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_http_requests_total", &labels).increment(1);
    histogram!("gateway_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// `outcome` is one of `success`, `fatal`, `exhausted`.
pub fn record_submission(outcome: &'static str, retries: u32) {
    counter!("gateway_gremlin_submissions_total", "outcome" => outcome).increment(1);
    if retries > 0 {
        tracing::debug!(outcome, retries, "Submission finished after retries");
    }
}

pub fn record_retry() {
    counter!("gateway_gremlin_retries_total").increment(1);
}

pub fn record_reconnect() {
    counter!("gateway_gremlin_reconnects_total").increment(1);
}

pub fn record_upstream_connected(connected: bool) {
    gauge!("gateway_upstream_connected").set(if connected { 1.0 } else { 0.0 });
}
