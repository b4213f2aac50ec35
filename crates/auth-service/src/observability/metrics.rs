//! Metrics definitions for the auth service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `status`: success, error
//! - `error_category`: `none` or a `TokenError`/`ClaimsError`/gate label
//! - `outcome`: success, invalid_credentials, error
//! - `operation`: hash, verify

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to render
/// the exposition at `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // bcrypt at cost 10-14 runs tens to hundreds of milliseconds
        .set_buckets_for_metric(
            Matcher::Prefix("auth_bcrypt".to_string()),
            &[0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000],
        )
        .map_err(|e| format!("Failed to set bcrypt buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record a token issuance attempt.
///
/// Metric: `auth_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str) {
    counter!("auth_token_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record a gate decision on a bearer token.
///
/// Metric: `auth_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record a `/login` outcome.
///
/// Metric: `auth_login_attempts_total`
/// Labels: `outcome`
pub fn record_login_attempt(outcome: &str) {
    counter!("auth_login_attempts_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record bcrypt operation duration.
///
/// Metric: `auth_bcrypt_duration_seconds`
/// Labels: `operation`
pub fn record_bcrypt_duration(operation: &str, duration: Duration) {
    histogram!("auth_bcrypt_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    // The metrics facade falls back to a no-op recorder when none is
    // installed, so these only exercise the recording paths.

    #[test]
    fn test_record_token_issuance() {
        record_token_issuance("success");
        record_token_issuance("error");
    }

    #[test]
    fn test_record_token_validation() {
        record_token_validation("success", None);
        record_token_validation("error", Some("missing_token"));
        record_token_validation("error", Some("signature_mismatch"));
        record_token_validation("error", Some("expired"));
    }

    #[test]
    fn test_record_login_attempt() {
        record_login_attempt("success");
        record_login_attempt("invalid_credentials");
        record_login_attempt("error");
    }

    #[test]
    fn test_record_bcrypt_duration() {
        record_bcrypt_duration("hash", Duration::from_millis(250));
        record_bcrypt_duration("verify", Duration::from_millis(240));
    }
}
