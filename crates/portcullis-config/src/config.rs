//! Main configuration types.
//!
//! This module provides the top-level [`PortcullisConfig`] struct and its builder.

use http::{HeaderName, Method};
use portcullis_core::AuthPolicy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{
    AuthConfig, ConfigError, CorsConfig, LogFormat, ResponseConfig, ServerConfig, TelemetrySection,
};

/// Complete Portcullis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use portcullis_config::PortcullisConfig;
///
/// let config = PortcullisConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.auth.secret_key, "test");
/// assert!(!config.auth.require_authorized);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PortcullisConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// CORS policy.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Bearer-token authentication policy.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Response decoration.
    #[serde(default)]
    pub response: ResponseConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl PortcullisConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> PortcullisConfigBuilder {
        PortcullisConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The server or metrics address is not a socket address
    /// - `max_body_bytes` is zero
    /// - A CORS list mixes `"*"` with other entries
    /// - A CORS method or header entry is not a valid token
    /// - Authentication is required with an empty or built-in default secret key
    /// - The charset is empty or contains separators
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.telemetry.metrics.enabled
            && self.telemetry.metrics.addr.parse::<SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        validate_wildcard("cors.allow_origins", &self.cors.allow_origins)?;
        validate_wildcard("cors.allow_methods", &self.cors.allow_methods)?;
        validate_wildcard("cors.allow_headers", &self.cors.allow_headers)?;

        for method in self.cors.allow_methods.iter().filter(|m| *m != "*") {
            if Method::from_bytes(method.trim().as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "cors.allow_methods",
                    format!("invalid method: {method}"),
                ));
            }
        }

        for header in self.cors.allow_headers.iter().filter(|h| *h != "*") {
            if HeaderName::from_bytes(header.trim().as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "cors.allow_headers",
                    format!("invalid header name: {header}"),
                ));
            }
        }

        if self.auth.require_authorized {
            if self.auth.secret_key.is_empty() {
                return Err(ConfigError::invalid_value(
                    "auth.secret_key",
                    "must not be empty when require_authorized is true",
                ));
            }
            if self.auth.secret_key == AuthPolicy::DEFAULT_SECRET_KEY {
                return Err(ConfigError::invalid_value(
                    "auth.secret_key",
                    "the built-in default key cannot be used when require_authorized is true",
                ));
            }
        }

        let charset = &self.response.charset;
        if charset.is_empty()
            || !charset
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"-_.:+".contains(&b))
        {
            return Err(ConfigError::invalid_value(
                "response.charset",
                format!("invalid charset: {charset:?}"),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty debug logging, authentication not required, any origin allowed.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_config::PortcullisConfig;
    ///
    /// let config = PortcullisConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;

        config.cors.allow_origins = vec!["*".to_string()];
        config.auth.require_authorized = false;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON info logging, metrics enabled and authentication required. The
    /// secret key is left empty, so [`validate`](Self::validate) fails until
    /// one is supplied.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_config::{LogFormat, PortcullisConfig};
    ///
    /// let mut config = PortcullisConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// assert!(config.auth.require_authorized);
    /// assert!(config.validate().is_err());
    ///
    /// config.auth.secret_key = "a-real-secret".to_string();
    /// assert!(config.validate().is_ok());
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;

        config.auth.require_authorized = true;
        config.auth.secret_key = String::new();

        config
    }
}

fn validate_wildcard(field: &str, list: &[String]) -> Result<(), ConfigError> {
    if list.len() > 1 && list.iter().any(|entry| entry == "*") {
        return Err(ConfigError::invalid_value(
            field,
            "\"*\" must be the only entry",
        ));
    }
    Ok(())
}

/// Builder for [`PortcullisConfig`].
#[derive(Debug, Default)]
pub struct PortcullisConfigBuilder {
    server: Option<ServerConfig>,
    cors: Option<CorsConfig>,
    auth: Option<AuthConfig>,
    response: Option<ResponseConfig>,
    telemetry: Option<TelemetrySection>,
}

impl PortcullisConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the CORS configuration.
    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Set the authentication configuration.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the response configuration.
    #[must_use]
    pub fn response(mut self, response: ResponseConfig) -> Self {
        self.response = Some(response);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> PortcullisConfig {
        PortcullisConfig {
            server: self.server.unwrap_or_default(),
            cors: self.cors.unwrap_or_default(),
            auth: self.auth.unwrap_or_default(),
            response: self.response.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }
}
