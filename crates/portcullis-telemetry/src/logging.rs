//! Structured logging.
//!
//! Filters log through `tracing` macros with structured fields; this module
//! installs the global subscriber that renders them. The logging filters and
//! the authentication gate emit full headers, bodies and verification errors
//! only when `DEBUG` is enabled for their target, and one summary line
//! otherwise.
//!
//! `RUST_LOG` wins over [`LogConfig::level`] when it is set.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Filter directive, e.g. `info` or `info,portcullis_filters=debug`.
    pub level: String,
    /// JSON lines instead of pretty output.
    pub json_format: bool,
    /// Include the module path of each event.
    pub include_target: bool,
    /// Include source file and line.
    pub file_line_info: bool,
    /// Include the thread id.
    pub thread_ids: bool,
    /// Name logged once when logging starts.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty, `debug` level output with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            include_target: true,
            file_line_info: true,
            thread_ids: false,
            service_name: "portcullis".to_string(),
        }
    }

    /// JSON, `info` level output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            include_target: true,
            file_line_info: false,
            thread_ids: false,
            service_name: "portcullis".to_string(),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.level)?,
    };

    let fmt = tracing_subscriber::fmt::layer()
        .with_target(config.include_target)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids);
    let fmt = if config.json_format {
        fmt.json().boxed()
    } else {
        fmt.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt.with_filter(filter))
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_format,
        "Logging initialized"
    );
    Ok(())
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive does not parse.
pub fn parse_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}
