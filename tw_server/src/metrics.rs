//! Prometheus metrics for the auth and session server.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until an
//! exporter is installed, so handlers call them unconditionally.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tw_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::signin_attempts_total(true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Signup outcome: `created`, `rejected`, `conflict` or `error`.
pub fn signup_total(outcome: &'static str) {
    metrics::counter!("signup_total", "outcome" => outcome).increment(1);
}

/// Increment signin attempts counter.
pub fn signin_attempts_total(success: bool) {
    metrics::counter!("signin_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// A presented token was rejected; `reason` is `invalid` or `expired`.
pub fn token_rejections_total(reason: &'static str) {
    metrics::counter!("token_rejections_total", "reason" => reason).increment(1);
}

// ============================================================================
// Session Gate Metrics
// ============================================================================

/// Gate redirect; `target` is `signin` or `landing`.
pub fn gate_redirects_total(target: &'static str) {
    metrics::counter!("gate_redirects_total", "target" => target).increment(1);
}
