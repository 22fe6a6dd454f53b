//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections and their
//! conversions into the runtime policy types.

use portcullis_core::{AuthPolicy, CorsPolicy};
use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use portcullis_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.shutdown_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Time allowed for reading a request body, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// CORS configuration section.
///
/// An empty list, or a list holding only `"*"`, allows anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Permitted origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,

    /// Permitted methods.
    #[serde(default)]
    pub allow_methods: Vec<String>,

    /// Permitted request headers.
    #[serde(default)]
    pub allow_headers: Vec<String>,

    /// Preflight cache duration in seconds. `<= 0` disables the header.
    #[serde(default = "default_max_age")]
    pub max_age: i64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            allow_methods: Vec::new(),
            allow_headers: Vec::new(),
            max_age: default_max_age(),
        }
    }
}

fn default_max_age() -> i64 {
    CorsPolicy::DEFAULT_MAX_AGE_SECONDS
}

impl CorsConfig {
    /// Builds the immutable runtime policy.
    #[must_use]
    pub fn to_policy(&self) -> CorsPolicy {
        CorsPolicy::new()
            .with_allow_origins(&self.allow_origins)
            .with_allow_methods(&self.allow_methods)
            .with_allow_headers(&self.allow_headers)
            .with_max_age_seconds(self.max_age)
    }
}

/// Bearer-token authentication section.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Symmetric key used to verify tokens.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Whether requests must carry a valid bearer token.
    #[serde(default)]
    pub require_authorized: bool,

    /// Path prefixes that bypass authentication.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            require_authorized: false,
            exclude_paths: Vec::new(),
        }
    }
}

fn default_secret_key() -> String {
    AuthPolicy::DEFAULT_SECRET_KEY.to_string()
}

impl AuthConfig {
    /// Builds the immutable runtime policy.
    #[must_use]
    pub fn to_policy(&self) -> AuthPolicy {
        AuthPolicy::new(self.secret_key.clone())
            .with_require_authorized(self.require_authorized)
            .with_exclude_paths(self.exclude_paths.iter().cloned())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("require_authorized", &self.require_authorized)
            .field("exclude_paths", &self.exclude_paths)
            .finish()
    }
}

/// Response decoration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Charset appended to `Content-Type` headers that lack one.
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            charset: default_charset(),
        }
    }
}

fn default_charset() -> String {
    "utf-8".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> portcullis_telemetry::LogConfig {
        let base = match self.format {
            LogFormat::Json => portcullis_telemetry::LogConfig::production(),
            LogFormat::Pretty => portcullis_telemetry::LogConfig::development(),
        };
        portcullis_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ..base
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus exporter listen address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

impl MetricsConfig {
    /// Converts to the telemetry crate's metrics configuration.
    #[must_use]
    pub fn to_metrics_config(&self) -> portcullis_telemetry::MetricsConfig {
        portcullis_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
            ..portcullis_telemetry::MetricsConfig::default()
        }
    }
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl TelemetrySection {
    /// Converts to the telemetry crate's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> portcullis_telemetry::TelemetryConfig {
        portcullis_telemetry::TelemetryConfig {
            logging: self.logging.to_log_config(),
            metrics: self.metrics.to_metrics_config(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_cors_to_policy() {
        let config = CorsConfig {
            allow_origins: vec!["https://A.com".to_string()],
            allow_methods: vec![],
            allow_headers: vec!["Content-Type".to_string()],
            max_age: 0,
        };
        let policy = config.to_policy();

        assert_eq!(policy.allow_origins(), ["https://a.com"]);
        assert_eq!(policy.allow_headers(), ["content-type"]);
        assert_eq!(policy.max_age_seconds(), 0);
    }

    #[test]
    fn test_cors_default_max_age() {
        let config: CorsConfig = toml::from_str("").expect("empty section should parse");
        assert_eq!(config.max_age, 10);
    }

    #[test]
    fn test_auth_to_policy() {
        let config = AuthConfig {
            secret_key: "k".to_string(),
            require_authorized: true,
            exclude_paths: vec!["/public/".to_string()],
        };
        let policy = config.to_policy();

        assert_eq!(policy.secret_key(), "k");
        assert!(policy.require_authorized());
        assert!(policy.is_excluded("/public/logo.png"));
    }

    #[test]
    fn test_auth_debug_redacts_secret() {
        let config = AuthConfig {
            secret_key: "hunter2".to_string(),
            ..AuthConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<AuthConfig, _> = toml::from_str("secret = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_to_log_config() {
        let config = LoggingConfig {
            enabled: true,
            level: "portcullis_filters=debug".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
        };
        let log = config.to_log_config();

        assert!(!log.json_format);
        assert!(!log.file_line_info);
        assert_eq!(log.level, "portcullis_filters=debug");
    }

    #[test]
    fn test_metrics_to_metrics_config() {
        let config = MetricsConfig {
            enabled: true,
            addr: "127.0.0.1:9100".to_string(),
        };
        let metrics = config.to_metrics_config();
        assert!(metrics.enabled);
        assert_eq!(metrics.addr, "127.0.0.1:9100");
        assert!(!metrics.duration_buckets.is_empty());
    }
}
