//! Observability for Portcullis.
//!
//! - **Logging**: structured logging through `tracing-subscriber`, JSON in
//!   production and pretty-printed in development
//! - **Metrics**: Prometheus-format counters and histograms through the
//!   `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `portcullis_requests_total` | Counter | `status` | Requests that completed the pipeline |
//! | `portcullis_request_duration_seconds` | Histogram | - | Pipeline latency |
//! | `portcullis_in_flight_requests` | Gauge | - | Requests currently being filtered |
//! | `portcullis_auth_outcomes_total` | Counter | `outcome` | Authentication gate decisions |
//! | `portcullis_preflight_total` | Counter | `outcome` | CORS preflight decisions |
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::default())?;
//! tracing::info!("telemetry ready");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_metrics() {
        let config = TelemetryConfig::default();
        assert!(config.logging.enabled);
        assert!(!config.metrics.enabled);
    }
}
