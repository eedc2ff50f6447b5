//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (upstream calls, latency, batch outcomes)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): by service, method, status
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency
//! - `gateway_batch_items_total` (counter): batch items by kind, outcome
//!
//! # Design Decisions
//! - Metric updates are cheap atomic operations on the hot path
//! - Exposition is optional; recording is unconditional and a no-op without
//!   an installed recorder

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and bind its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "failed to start metrics endpoint"),
    }
}

/// Record one outbound upstream call.
pub fn record_upstream_request(service: &str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("service", service.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gateway_upstream_requests_total", &labels).increment(1);
    metrics::histogram!(
        "gateway_upstream_duration_seconds",
        &[("service", service.to_string())]
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the outcome counts of one processed batch.
pub fn record_batch(kind: &str, successful: usize, failed: usize) {
    metrics::counter!(
        "gateway_batch_items_total",
        &[("kind", kind.to_string()), ("outcome", "success".to_string())]
    )
    .increment(successful as u64);
    metrics::counter!(
        "gateway_batch_items_total",
        &[("kind", kind.to_string()), ("outcome", "failure".to_string())]
    )
    .increment(failed as u64);
}
