//! Error classification.
//!
//! Authentication and CORS failures never surface as Rust errors: filters
//! resolve them into tagged outcomes and a terminal response. This module
//! names those failure categories and the status codes they map to, and
//! provides [`HttpError`] for handlers that want to fail with a specific
//! status instead of a generic 500.
//!
//! | `ErrorCategory` | Status | Client body |
//! |---|---|---|
//! | `MalformedCredential` | 401 | `missing or malformed credential` |
//! | `InvalidCredential` | 401 | `invalid credential` |
//! | `CorsPolicyViolation` | 403 | empty |
//! | `Application` | 500 | best-effort error message |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of failures produced while filtering a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// `Authorization` header missing or not a bearer credential.
    MalformedCredential,
    /// The token verifier rejected the bearer token.
    InvalidCredential,
    /// A preflight request was not permitted by the CORS policy.
    CorsPolicyViolation,
    /// The application handler failed.
    Application,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::CorsPolicyViolation => StatusCode::FORBIDDEN,
            Self::Application => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short, non-sensitive reason shown to clients.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MalformedCredential => "missing or malformed credential",
            Self::InvalidCredential => "invalid credential",
            Self::CorsPolicyViolation => "cross-origin request not allowed",
            Self::Application => "internal error",
        }
    }

    /// Returns the snake_case label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedCredential => "malformed_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::CorsPolicyViolation => "cors_policy_violation",
            Self::Application => "application",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that already knows its HTTP response.
///
/// Handlers return it (wrapped in `anyhow::Error`) to fail with a chosen
/// status; the exception mapper passes it through unchanged instead of
/// producing a 500.
///
/// # Example
///
/// ```
/// use portcullis_core::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::not_found("order 42 does not exist");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// Creates an error with the given status and client-visible message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the client-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
