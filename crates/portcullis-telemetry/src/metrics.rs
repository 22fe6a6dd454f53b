//! Prometheus metrics for Portcullis.
//!
//! Recording functions go through the `metrics` facade and are no-ops until
//! [`init_metrics`] installs the Prometheus recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_telemetry::metrics::{record_preflight, record_request};
//!
//! record_preflight("allowed");
//! record_request(204, Duration::from_millis(2));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "portcullis_requests_total";
/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "portcullis_request_duration_seconds";
/// In-flight gauge name.
pub const IN_FLIGHT_REQUESTS: &str = "portcullis_in_flight_requests";
/// Authentication outcome counter name.
pub const AUTH_OUTCOMES_TOTAL: &str = "portcullis_auth_outcomes_total";
/// Preflight outcome counter name.
pub const PREFLIGHT_TOTAL: &str = "portcullis_preflight_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the Prometheus exporter is installed.
    pub enabled: bool,

    /// Address the exporter listens on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` if `addr` does not parse, or
/// `TelemetryError::MetricsInit` if the recorder cannot be installed.
/// Must be called inside a Tokio runtime when enabled.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|source| TelemetryError::InvalidAddress {
            addr: config.addr.clone(),
            source,
        })?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(error) = exporter.await {
            tracing::warn!(?error, "Prometheus listener stopped");
        }
    });
    tracing::info!(%addr, "Prometheus listener started");

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests that completed the pipeline");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Pipeline duration in seconds");
    describe_gauge!(IN_FLIGHT_REQUESTS, "Requests currently being filtered");
    describe_counter!(AUTH_OUTCOMES_TOTAL, "Authentication gate decisions by outcome");
    describe_counter!(PREFLIGHT_TOTAL, "CORS preflight decisions by outcome");
}

/// Records a completed request.
pub fn record_request(status_code: u16, duration: Duration) {
    counter!(REQUESTS_TOTAL, "status" => status_code.to_string()).increment(1);
    histogram!(REQUEST_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Records an authentication gate decision
/// (`passthrough`, `authenticated`, `malformed_credential`, `invalid_credential`).
pub fn record_auth_outcome(outcome: &'static str) {
    counter!(AUTH_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
}

/// Records a preflight decision (`allowed`, `forbidden`).
pub fn record_preflight(outcome: &'static str) {
    counter!(PREFLIGHT_TOTAL, "outcome" => outcome).increment(1);
}

/// Guard that tracks one in-flight request.
///
/// Increments the in-flight gauge on creation and decrements it on drop.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
