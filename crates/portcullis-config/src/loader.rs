//! Layered configuration loading.
//!
//! | Layer | Source |
//! |-------|--------|
//! | 1 | Built-in defaults, or the development/production preset |
//! | 2 | A TOML or JSON file, or an in-memory string |
//! | 3 | `.env`, copied into the process environment |
//! | 4 | `PREFIX__SECTION__KEY` environment variables |
//!
//! Validation runs once, on [`ConfigLoader::load`].

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, LogFormat, PortcullisConfig};

/// Builds a [`PortcullisConfig`] from layered sources.
///
/// # Example
///
/// ```no_run
/// use portcullis_config::ConfigLoader;
///
/// # fn main() -> Result<(), portcullis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("portcullis.toml")?
///     .with_dotenv()?
///     .with_env_prefix("PORTCULLIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PortcullisConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PortcullisConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = PortcullisConfig::default();
        self
    }

    /// Start with development preset configuration.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PortcullisConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = PortcullisConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format (`.toml` or `.json`) is determined by the file extension.
    /// The file replaces the current layer; sections it omits take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read, is
    /// not valid TOML/JSON, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unsupported.
    ///
    /// # Example
    ///
    /// ```
    /// use portcullis_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [cors]
    ///     allow_origins = ["https://a.com"]
    ///     allow_headers = ["content-type"]
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.cors.allow_origins, vec!["https://a.com"]);
    /// assert_eq!(config.cors.max_age, 10);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::unsupported_format(format))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`; lists are
    /// comma-separated. For example, with prefix "PORTCULLIS":
    /// - `PORTCULLIS__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `PORTCULLIS__CORS__ALLOW_ORIGINS=https://a.com,https://b.com`
    /// - `PORTCULLIS__AUTH__REQUIRE_AUTHORIZED=true`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<PortcullisConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without applying overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> PortcullisConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<PortcullisConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::unsupported_format(other.unwrap_or(""))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, var: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = var.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };

        let cfg = &mut self.config;
        match path {
            "SERVER__HTTP_ADDR" => cfg.server.http_addr = value.to_string(),
            "SERVER__SHUTDOWN_TIMEOUT_SECS" => {
                cfg.server.shutdown_timeout_secs = parse_number(var, value)?;
            }
            "SERVER__REQUEST_TIMEOUT_MS" => cfg.server.request_timeout_ms = parse_number(var, value)?,
            "SERVER__MAX_BODY_BYTES" => cfg.server.max_body_bytes = parse_number(var, value)?,

            "CORS__ALLOW_ORIGINS" => cfg.cors.allow_origins = parse_list(value),
            "CORS__ALLOW_METHODS" => cfg.cors.allow_methods = parse_list(value),
            "CORS__ALLOW_HEADERS" => cfg.cors.allow_headers = parse_list(value),
            "CORS__MAX_AGE" => cfg.cors.max_age = parse_number(var, value)?,

            "AUTH__SECRET_KEY" => cfg.auth.secret_key = value.to_string(),
            "AUTH__REQUIRE_AUTHORIZED" => cfg.auth.require_authorized = parse_flag(var, value)?,
            "AUTH__EXCLUDE_PATHS" => cfg.auth.exclude_paths = parse_list(value),

            "RESPONSE__CHARSET" => cfg.response.charset = value.trim().to_string(),

            "TELEMETRY__LOGGING__ENABLED" => {
                cfg.telemetry.logging.enabled = parse_flag(var, value)?;
            }
            "TELEMETRY__LOGGING__LEVEL" => cfg.telemetry.logging.level = value.to_string(),
            "TELEMETRY__LOGGING__FORMAT" => {
                cfg.telemetry.logging.format = if value.eq_ignore_ascii_case("json") {
                    LogFormat::Json
                } else if value.eq_ignore_ascii_case("pretty") {
                    LogFormat::Pretty
                } else {
                    return Err(ConfigError::invalid_env(var, "expected 'json' or 'pretty'"));
                };
            }
            "TELEMETRY__LOGGING__INCLUDE_LOCATION" => {
                cfg.telemetry.logging.include_location = parse_flag(var, value)?;
            }
            "TELEMETRY__METRICS__ENABLED" => {
                cfg.telemetry.metrics.enabled = parse_flag(var, value)?;
            }
            "TELEMETRY__METRICS__ADDR" => cfg.telemetry.metrics.addr = value.to_string(),

            // Other variables sharing the prefix belong to someone else.
            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env(var, "expected integer"))
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_env(var, "expected boolean")),
    }
}

/// Splits a comma-separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
