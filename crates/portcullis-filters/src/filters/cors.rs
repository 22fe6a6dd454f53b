//! CORS negotiation.
//!
//! [`CorsNegotiator`] answers preflight (`OPTIONS`) requests itself, as a
//! request filter, and adds `Access-Control-Allow-Origin` to credentialed
//! actual responses, as a response filter. The same instance is usually
//! registered on both sides of the pipeline.
//!
//! # Preflight Decision
//!
//! A preflight is forbidden (`403`, empty body, no CORS headers) when:
//!
//! - `Origin` is absent, empty, repeated or the opaque origin `null`
//! - `Access-Control-Request-Method` is absent
//! - the policy restricts origins and does not list `Origin` exactly
//! - the policy restricts headers and does not list every requested header
//!
//! Otherwise it is allowed (`204`, empty body) and the response carries:
//!
//! | Header | Value |
//! |---|---|
//! | `Access-Control-Allow-Origin` | the request `Origin`, verbatim |
//! | `Access-Control-Allow-Methods` | the requested method, if the policy permits it |
//! | `Access-Control-Allow-Headers` | the requested headers, verbatim, if any |
//!
//! Repeated `Access-Control-Request-Headers` lines are joined with `", "` and
//! checked as one list.
//! | `Access-Control-Expose-Headers` | `content-disposition`, if it was requested |
//! | `Access-Control-Max-Age` | the policy max age, if positive |

use crate::context::FilterContext;
use crate::filter::{Filter, FilterAction, RequestFilter, ResponseFilter};
use crate::types::{BoxFuture, Request, RequestHead, Response, ResponseExt};
use http::header::{HeaderMap, HeaderValue, ToStrError};
use http::{Method, StatusCode};
use portcullis_core::{CorsPolicy, ErrorCategory};
use portcullis_telemetry::metrics::record_preflight;
use std::sync::Arc;
use tracing::debug;

/// CORS header names.
pub mod headers {
    use http::header::{self, HeaderName};

    /// The `Origin` request header.
    pub const ORIGIN: HeaderName = header::ORIGIN;
    /// The `Authorization` request header.
    pub const AUTHORIZATION: HeaderName = header::AUTHORIZATION;
    /// The `Access-Control-Request-Method` preflight header.
    pub const REQUEST_METHOD: HeaderName = header::ACCESS_CONTROL_REQUEST_METHOD;
    /// The `Access-Control-Request-Headers` preflight header.
    pub const REQUEST_HEADERS: HeaderName = header::ACCESS_CONTROL_REQUEST_HEADERS;
    /// The `Access-Control-Allow-Origin` response header.
    pub const ALLOW_ORIGIN: HeaderName = header::ACCESS_CONTROL_ALLOW_ORIGIN;
    /// The `Access-Control-Allow-Methods` response header.
    pub const ALLOW_METHODS: HeaderName = header::ACCESS_CONTROL_ALLOW_METHODS;
    /// The `Access-Control-Allow-Headers` response header.
    pub const ALLOW_HEADERS: HeaderName = header::ACCESS_CONTROL_ALLOW_HEADERS;
    /// The `Access-Control-Expose-Headers` response header.
    pub const EXPOSE_HEADERS: HeaderName = header::ACCESS_CONTROL_EXPOSE_HEADERS;
    /// The `Access-Control-Max-Age` response header.
    pub const MAX_AGE: HeaderName = header::ACCESS_CONTROL_MAX_AGE;
}

const CONTENT_DISPOSITION: &str = "content-disposition";

/// Result of evaluating a preflight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightOutcome {
    /// The preflight is allowed; these headers go on the `204` response.
    Allowed(HeaderMap),
    /// The preflight is not allowed.
    Forbidden,
}

impl PreflightOutcome {
    /// Returns `true` for [`PreflightOutcome::Allowed`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// Builds the terminal response for this outcome.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Allowed(headers) => {
                let mut response = Response::empty(StatusCode::NO_CONTENT);
                response.headers_mut().extend(headers);
                response
            }
            Self::Forbidden => {
                Response::empty(ErrorCategory::CorsPolicyViolation.status_code())
            }
        }
    }
}

/// CORS negotiator for preflight and actual requests.
///
/// # Example
///
/// ```
/// use http::HeaderMap;
/// use portcullis_core::CorsPolicy;
/// use portcullis_filters::filters::cors::{headers, CorsNegotiator};
///
/// let cors = CorsNegotiator::new(
///     CorsPolicy::new()
///         .with_allow_origins(["https://a.com"])
///         .with_allow_headers(["content-type"]),
/// );
///
/// let mut request = HeaderMap::new();
/// request.insert(headers::ORIGIN, "https://a.com".parse().unwrap());
/// request.insert(headers::REQUEST_METHOD, "POST".parse().unwrap());
///
/// assert!(cors.handle_preflight(&request).is_allowed());
/// ```
#[derive(Debug, Clone)]
pub struct CorsNegotiator {
    policy: Arc<CorsPolicy>,
}

impl CorsNegotiator {
    /// Creates a negotiator for `policy`.
    pub fn new(policy: impl Into<Arc<CorsPolicy>>) -> Self {
        Self {
            policy: policy.into(),
        }
    }

    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> &CorsPolicy {
        &self.policy
    }

    /// Decides a preflight from its request headers.
    ///
    /// Depends on nothing but `headers` and the policy.
    #[must_use]
    pub fn handle_preflight(&self, headers: &HeaderMap) -> PreflightOutcome {
        let mut origins = headers.get_all(headers::ORIGIN).into_iter();
        let Some(origin) = origins.next().filter(|value| is_concrete_origin(value)) else {
            return PreflightOutcome::Forbidden;
        };
        if origins.next().is_some() {
            return PreflightOutcome::Forbidden;
        }

        let Some(method) = headers
            .get(headers::REQUEST_METHOD)
            .filter(|value| value.to_str().is_ok_and(|m| !m.trim().is_empty()))
        else {
            return PreflightOutcome::Forbidden;
        };

        let Ok(requested_headers) = requested_header_list(headers) else {
            return PreflightOutcome::Forbidden;
        };

        let Ok(origin_str) = origin.to_str() else {
            return PreflightOutcome::Forbidden;
        };
        if !self.policy.allows_origin(origin_str) {
            return PreflightOutcome::Forbidden;
        }
        if !self
            .policy
            .allows_request_headers(requested_headers.as_deref())
        {
            return PreflightOutcome::Forbidden;
        }

        let mut allowed = HeaderMap::new();
        allowed.insert(headers::ALLOW_ORIGIN, origin.clone());

        if method
            .to_str()
            .is_ok_and(|m| self.policy.allows_method(m.trim()))
        {
            allowed.insert(headers::ALLOW_METHODS, method.clone());
        }

        if let Some(list) = requested_headers {
            let Ok(value) = HeaderValue::from_str(&list) else {
                return PreflightOutcome::Forbidden;
            };
            allowed.insert(headers::ALLOW_HEADERS, value);
            if list
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case(CONTENT_DISPOSITION))
            {
                allowed.insert(
                    headers::EXPOSE_HEADERS,
                    HeaderValue::from_static(CONTENT_DISPOSITION),
                );
            }
        }

        let max_age = self.policy.max_age_seconds();
        if max_age > 0 {
            allowed.insert(headers::MAX_AGE, HeaderValue::from(max_age));
        }

        PreflightOutcome::Allowed(allowed)
    }

    /// Adds `Access-Control-Allow-Origin` to the response of a credentialed
    /// cross-origin request.
    ///
    /// Applies only to non-`OPTIONS` requests carrying both `Origin` and
    /// `Authorization`. No other header is touched.
    pub fn annotate_actual_response(&self, request: &RequestHead, response: &mut Response) {
        if request.method() == Method::OPTIONS {
            return;
        }
        let headers = request.headers();
        if !headers.contains_key(headers::AUTHORIZATION) {
            return;
        }
        if let Some(origin) = headers.get(headers::ORIGIN) {
            response
                .headers_mut()
                .insert(headers::ALLOW_ORIGIN, origin.clone());
        }
    }
}

/// Joins every `Access-Control-Request-Headers` line into one list.
fn requested_header_list(headers: &HeaderMap) -> Result<Option<String>, ToStrError> {
    let mut joined: Option<String> = None;
    for value in &headers.get_all(headers::REQUEST_HEADERS) {
        let line = value.to_str()?.trim();
        if line.is_empty() {
            continue;
        }
        match joined.as_mut() {
            Some(list) => {
                list.push_str(", ");
                list.push_str(line);
            }
            None => joined = Some(line.to_owned()),
        }
    }
    Ok(joined)
}

fn is_concrete_origin(value: &HeaderValue) -> bool {
    value
        .to_str()
        .map(str::trim)
        .is_ok_and(|origin| !origin.is_empty() && origin != "null")
}

impl Filter for CorsNegotiator {
    fn name(&self) -> &'static str {
        "cors"
    }
}

impl RequestFilter for CorsNegotiator {
    fn filter_request<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a mut Request,
    ) -> BoxFuture<'a, FilterAction> {
        Box::pin(async move {
            if request.method() != Method::OPTIONS {
                return FilterAction::Continue;
            }

            let outcome = self.handle_preflight(request.headers());
            let label = if outcome.is_allowed() { "allowed" } else { "forbidden" };
            record_preflight(label);
            debug!(
                request_id = %ctx.request_id(),
                path = request.uri().path(),
                outcome = label,
                "Preflight evaluated"
            );

            FilterAction::Abort(outcome.into_response())
        })
    }
}

impl ResponseFilter for CorsNegotiator {
    fn filter_response<'a>(
        &'a self,
        _ctx: &'a mut FilterContext,
        request: &'a RequestHead,
        response: &'a mut Response,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.annotate_actual_response(request, response);
        })
    }
}
