//! # Portcullis Core
//!
//! Core types and traits for the Portcullis filter chain.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ExecutionContext`] - Request-scoped key/value store populated by authentication
//! - [`ClaimSet`] - Decoded token payload
//! - [`TokenVerifier`] - Capability that turns a bearer token into a [`ClaimSet`]
//! - [`CorsPolicy`] / [`AuthPolicy`] - Immutable policies shared by all requests
//! - [`ErrorCategory`] / [`HttpError`] - Error classification and handler errors
//! - [`YearMonth`] - `yyyyMM` request parameter type

#![doc(html_root_url = "https://docs.rs/portcullis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod claims;
mod context;
mod error;
mod policy;
mod token;
mod year_month;

pub use claims::ClaimSet;
pub use context::{ExecutionContext, RequestId};
pub use error::{ErrorCategory, HttpError};
pub use policy::{AuthPolicy, CorsPolicy};
pub use token::{DecodeError, Hs256Verifier, TokenVerifier};
pub use year_month::{ParseYearMonthError, YearMonth};
