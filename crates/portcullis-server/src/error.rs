//! Server error types.

use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No handler was given to the builder.
    #[error("no request handler configured")]
    MissingHandler,
}

impl ServerError {
    /// Creates an invalid address error.
    pub fn invalid_address(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }
}
