//! Filters shipped with Portcullis.
//!
//! | Filter | Side | Default priority |
//! |---|---|---|
//! | [`RequestLoggingFilter`] | request | [`REQUEST_LOGGING`](crate::priorities::REQUEST_LOGGING) |
//! | [`CorsNegotiator`] | request | [`PREFLIGHT`](crate::priorities::PREFLIGHT) |
//! | [`AuthenticationGate`] | request | [`AUTHENTICATION`](crate::priorities::AUTHENTICATION) |
//! | [`CreatedStatusFilter`] | response | [`HEADER_DECORATOR`](crate::priorities::HEADER_DECORATOR) |
//! | [`CharsetFilter`] | response | [`ENTITY_CODER`](crate::priorities::ENTITY_CODER) |
//! | [`CorsNegotiator`] | response | [`CORS_ANNOTATION`](crate::priorities::CORS_ANNOTATION) |
//! | [`ResponseLoggingFilter`] | response | [`RESPONSE_LOGGING`](crate::priorities::RESPONSE_LOGGING) |
//!
//! [`ExceptionMapper`] is not a filter; the pipeline calls it when the
//! handler fails.

pub mod auth;
pub mod charset;
pub mod cors;
pub mod created_status;
pub mod exception;
pub mod logging;

pub use auth::{AuthenticationGate, GateOutcome};
pub use charset::CharsetFilter;
pub use cors::{CorsNegotiator, PreflightOutcome};
pub use created_status::CreatedStatusFilter;
pub use exception::{ErrorMapping, ExceptionMapper};
pub use logging::{RequestLoggingFilter, ResponseLoggingFilter};
