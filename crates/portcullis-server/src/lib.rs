//! HTTP server for Portcullis.
//!
//! Accepts HTTP/1.1 connections with `hyper`, buffers each request body and
//! hands the request to a [`portcullis_filters::Pipeline`] wrapped around the
//! application handler. Shutdown is graceful: the listener closes first, then
//! open connections get `shutdown_timeout_secs` to finish.
//!
//! | Failure | Status |
//! |---------|--------|
//! | Body larger than `max_body_bytes` | `413` |
//! | Body not received within `request_timeout_ms` | `408` |
//! | Body could not be read | `400` |
//!
//! Everything else is decided by the pipeline.

#![doc(html_root_url = "https://docs.rs/portcullis-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod server;
mod shutdown;

pub use error::ServerError;
pub use server::{Handler, Server, ServerBuilder};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
