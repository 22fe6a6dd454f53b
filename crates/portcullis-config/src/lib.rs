//! Typed configuration for Portcullis.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides and `.env` files
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`PortcullisConfig`] holds every section:
//!
//! - [`ServerConfig`] - bind address, timeouts, body limit
//! - [`CorsConfig`] - allowed origins, methods, headers, preflight max age
//! - [`AuthConfig`] - bearer-token secret, whether it is required, excluded paths
//! - [`ResponseConfig`] - default response charset
//! - [`TelemetrySection`] - logging and metrics
//!
//! Policies are built from it once at startup ([`CorsConfig::to_policy`],
//! [`AuthConfig::to_policy`]) and never change afterwards.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//!
//! [cors]
//! allow_origins = ["https://app.example.com"]
//! allow_methods = []
//! allow_headers = ["content-type", "authorization"]
//! max_age = 600
//!
//! [auth]
//! secret_key = "change-me"
//! require_authorized = true
//! exclude_paths = ["/static/", "/health"]
//!
//! [response]
//! charset = "utf-8"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `PORTCULLIS__AUTH__SECRET_KEY=change-me`
//! - `PORTCULLIS__CORS__ALLOW_HEADERS=content-type,authorization`
//! - `PORTCULLIS__TELEMETRY__LOGGING__LEVEL=debug`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
