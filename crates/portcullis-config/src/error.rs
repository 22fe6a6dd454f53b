//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`PortcullisConfig`](crate::PortcullisConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file {} does not exist", path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format '{format}', expected toml or json")]
    UnsupportedFormat {
        /// The format or file extension that was given.
        format: String,
    },

    /// The TOML source does not match the schema.
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The JSON source does not match the schema.
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file exists but cannot be parsed.
    #[error("bad .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An environment override does not parse.
    #[error("environment override {var}: {reason}")]
    InvalidEnv {
        /// The variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A loaded value is out of range or malformed.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field, e.g. `cors.allow_origins`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn invalid_env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the offending field for value errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::missing("/etc/portcullis.toml");
        assert_eq!(
            err.to_string(),
            "configuration file /etc/portcullis.toml does not exist"
        );

        let err = ConfigError::invalid_env("PORTCULLIS__CORS__MAX_AGE", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment override PORTCULLIS__CORS__MAX_AGE: expected integer"
        );

        let err = ConfigError::unsupported_format("yaml");
        assert!(err.to_string().contains("'yaml'"));
    }

    #[test]
    fn test_field_accessor() {
        let err = ConfigError::invalid_value("cors.allow_headers", "invalid header name: a b");
        assert_eq!(err.field(), Some("cors.allow_headers"));
        assert_eq!(err.to_string(), "cors.allow_headers: invalid header name: a b");
        assert_eq!(ConfigError::unsupported_format("ini").field(), None);
    }
}
