//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! When enabled, `/metrics` is on the public allow-list so Prometheus can
//! scrape it. Labels are bounded and carry no usernames or tokens.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE auth_login_attempts_total counter
/// auth_login_attempts_total{outcome="success"} 42
/// ```
#[tracing::instrument(skip_all, name = "auth.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
