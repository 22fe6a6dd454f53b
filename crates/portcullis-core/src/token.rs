//! Bearer token verification.
//!
//! The filters only depend on the [`TokenVerifier`] trait. [`Hs256Verifier`]
//! is the default implementation, backed by `jsonwebtoken`.

use crate::claims::ClaimSet;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a token can fail verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The token is not a well-formed JWT.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("token has expired")]
    Expired,

    /// The `nbf` claim is in the future.
    #[error("token is not valid yet")]
    NotYetValid,

    /// Any other verification failure.
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<jsonwebtoken::errors::Error> for DecodeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed(err.to_string()),
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            _ => Self::Rejected(err.to_string()),
        }
    }
}

/// Turns a bearer token into a claim set.
///
/// Implementations must be safe to share across concurrent requests.
/// Verification is synchronous; failures are classified as [`DecodeError`]
/// and never retried.
pub trait TokenVerifier: Send + Sync + 'static {
    /// Verifies `token` with `secret_key` and returns its claims.
    fn verify(&self, token: &str, secret_key: &str) -> Result<ClaimSet, DecodeError>;
}

/// HMAC-SHA256 JWT verifier.
///
/// `exp` and `nbf` are checked when present but no claim is mandatory and the
/// audience is not checked.
///
/// # Example
///
/// ```
/// use portcullis_core::{Hs256Verifier, TokenVerifier, DecodeError};
///
/// let verifier = Hs256Verifier::new();
/// let result = verifier.verify("not-a-jwt", "secret");
/// assert!(matches!(result, Err(DecodeError::Malformed(_))));
/// ```
#[derive(Debug, Clone)]
pub struct Hs256Verifier {
    validation: Validation,
}

impl Hs256Verifier {
    /// Creates a verifier with no clock leeway.
    #[must_use]
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = 0;
        Self { validation }
    }

    /// Allows `seconds` of clock skew when checking `exp` and `nbf`.
    #[must_use]
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }
}

impl Default for Hs256Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for Hs256Verifier {
    fn verify(&self, token: &str, secret_key: &str) -> Result<ClaimSet, DecodeError> {
        let key = DecodingKey::from_secret(secret_key.as_bytes());
        let data = decode::<Map<String, Value>>(token, &key, &self.validation)?;
        Ok(ClaimSet::new(data.claims))
    }
}
