//! Filter priorities.
//!
//! Lower values run earlier, on both sides of the pipeline.
//!
//! | Constant | Value |
//! |---|---|
//! | [`REQUEST_LOGGING`] | 900 |
//! | [`PREFLIGHT`] | 950 |
//! | [`AUTHENTICATION`] | 1000 |
//! | [`AUTHORIZATION`] | 2000 |
//! | [`HEADER_DECORATOR`] | 3000 |
//! | [`ENTITY_CODER`] | 4000 |
//! | [`USER`] | 5000 |
//! | [`CORS_ANNOTATION`] | 5100 |
//! | [`RESPONSE_LOGGING`] | 6000 |

/// Authentication filters.
pub const AUTHENTICATION: i32 = 1000;

/// Authorization filters.
pub const AUTHORIZATION: i32 = 2000;

/// Filters that add or rewrite headers and status.
pub const HEADER_DECORATOR: i32 = 3000;

/// Filters that encode or describe the entity.
pub const ENTITY_CODER: i32 = 4000;

/// Default priority for application filters.
pub const USER: i32 = 5000;

/// Request logging, ahead of everything that may abort.
pub const REQUEST_LOGGING: i32 = AUTHENTICATION - 100;

/// CORS preflight interception, ahead of authentication.
pub const PREFLIGHT: i32 = AUTHENTICATION - 50;

/// CORS annotation of actual responses.
pub const CORS_ANNOTATION: i32 = USER + 100;

/// Response logging, last so it sees the final response.
pub const RESPONSE_LOGGING: i32 = USER + 1000;
