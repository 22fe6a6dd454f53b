//! Telemetry errors.

use std::net::AddrParseError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive does not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// The subscriber could not be installed, usually because one already is.
    #[error("cannot install log subscriber: {0}")]
    LoggingInit(#[from] TryInitError),

    /// The metrics listener address does not parse.
    #[error("invalid metrics address '{addr}': {source}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Parser error.
        #[source]
        source: AddrParseError,
    },

    /// The Prometheus recorder could not be built or installed.
    #[error("cannot install metrics recorder: {0}")]
    MetricsInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let source = "nowhere".parse::<std::net::SocketAddr>().unwrap_err();
        let err = TelemetryError::InvalidAddress {
            addr: "nowhere".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid metrics address 'nowhere'"));

        let err = TelemetryError::MetricsInit("recorder already set".to_string());
        assert_eq!(
            err.to_string(),
            "cannot install metrics recorder: recorder already set"
        );
    }
}
