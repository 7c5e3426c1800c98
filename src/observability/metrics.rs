//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, matched route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//! - `contact_submissions_total` (counter): contact outcomes
//! - `admin_auth_denied_total` (counter): admin gate denials by reason
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and metric-less deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_contact(outcome: &'static str) {
    counter!("contact_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_admin_denied(reason: &'static str) {
    counter!("admin_auth_denied_total", "reason" => reason).increment(1);
}
