//! Handler error mapping.
//!
//! [`ExceptionMapper`] turns the `anyhow::Error` returned by a failed handler
//! into a `text/plain` response:
//!
//! 1. An [`HttpError`] anywhere in the error chain answers with its own
//!    status and message
//! 2. Otherwise the first registered mapping whose error type appears in the
//!    chain decides the status and body
//! 3. Otherwise the response is `500` with the root cause's message
//!
//! Every mapped error is logged at `WARN`.

use crate::types::{Response, ResponseExt};
use http::StatusCode;
use portcullis_core::{ErrorCategory, HttpError};
use tracing::warn;

/// Status and body used for a registered error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMapping {
    status: StatusCode,
    body: Option<String>,
}

impl ErrorMapping {
    /// Maps to `status`, with the root cause's message as body.
    #[must_use]
    pub const fn new(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// Uses a fixed body instead of the error message.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the mapped status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl Default for ErrorMapping {
    fn default() -> Self {
        Self::new(ErrorCategory::Application.status_code())
    }
}

type Matcher = Box<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

/// Converts handler errors into responses.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portcullis_filters::filters::{ErrorMapping, ExceptionMapper};
///
/// let mapper = ExceptionMapper::new()
///     .map::<std::num::ParseIntError>(ErrorMapping::new(StatusCode::BAD_REQUEST));
///
/// let error = anyhow::Error::new("x1".parse::<i32>().unwrap_err());
/// assert_eq!(mapper.to_response(&error).status(), StatusCode::BAD_REQUEST);
///
/// let error = anyhow::anyhow!("boom");
/// assert_eq!(mapper.to_response(&error).status(), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
#[derive(Default)]
pub struct ExceptionMapper {
    mappings: Vec<(&'static str, Matcher, ErrorMapping)>,
}

impl ExceptionMapper {
    /// Creates a mapper with no registered types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping for errors of type `E`.
    ///
    /// Mappings are tried in registration order.
    #[must_use]
    pub fn map<E>(mut self, mapping: ErrorMapping) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let matcher: Matcher =
            Box::new(|error: &anyhow::Error| error.chain().any(|cause| cause.is::<E>()));
        self.mappings
            .push((std::any::type_name::<E>(), matcher, mapping));
        self
    }

    /// Returns the number of registered mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns `true` if no mapping is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Builds the response for `error`.
    #[must_use]
    pub fn to_response(&self, error: &anyhow::Error) -> Response {
        let (status, body) = self.resolve(error);
        warn!(
            status = status.as_u16(),
            error = %format!("{error:#}"),
            "Handler failed"
        );
        Response::error(status, &body)
    }

    fn resolve(&self, error: &anyhow::Error) -> (StatusCode, String) {
        if let Some(http_error) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<HttpError>())
        {
            return (http_error.status(), http_error.message().to_owned());
        }

        if let Some((_, _, mapping)) = self.mappings.iter().find(|(_, matches, _)| matches(error)) {
            let body = mapping
                .body
                .clone()
                .unwrap_or_else(|| root_cause_message(error));
            return (mapping.status, body);
        }

        (
            ErrorCategory::Application.status_code(),
            root_cause_message(error),
        )
    }
}

fn root_cause_message(error: &anyhow::Error) -> String {
    let message = error.root_cause().to_string();
    if message.is_empty() {
        format!("{error:#}")
    } else {
        message
    }
}

impl std::fmt::Debug for ExceptionMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.mappings.iter().map(|(name, _, mapping)| (name, mapping)))
            .finish()
    }
}
