//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): completed forwards by upstream, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end forward latency,
//!   retries and backoff included
//! - `gateway_upstream_retries_total` (counter): retries by upstream
//! - `gateway_auth_rejections_total` (counter): gate rejections by reason
//!
//! # Cardinality
//! - `upstream`: 3 values
//! - `status`: numeric HTTP status
//! - `reason`: bounded by the token error kinds plus `token_required`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished forward.
pub fn record_request(upstream: &'static str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "upstream" => upstream,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "upstream" => upstream)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(upstream: &'static str) {
    counter!("gateway_upstream_retries_total", "upstream" => upstream).increment(1);
}

pub fn record_auth_rejection(reason: &'static str) {
    counter!("gateway_auth_rejections_total", "reason" => reason).increment(1);
}
