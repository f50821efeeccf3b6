//! Metrics collection and exposition.
//!
//! # Metrics
//! - `headless_requests_total` (counter): requests by route, status
//! - `headless_request_duration_seconds` (histogram): latency by route
//! - `headless_resolutions_total` (counter): resolved descriptors by kind
//! - `headless_config_reloads_total` (counter): applied config reloads
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and the
//!   CLI never need one
//! - Route label is the matched route template, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "headless_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("headless_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(kind: &str) {
    counter!("headless_resolutions_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_config_reload() {
    counter!("headless_config_reloads_total").increment(1);
}
