//! Request and response logging.
//!
//! With `DEBUG` enabled for this crate, both filters log headers and the full
//! body; otherwise they log one `INFO` line. Bodies are read from a clone of
//! the in-memory body, so the request or response is left unchanged.
//! The `Authorization` header is never logged.

use crate::context::FilterContext;
use crate::filter::{Filter, FilterAction, RequestFilter, ResponseFilter};
use crate::types::{BoxFuture, Request, RequestHead, Response};
use bytes::Bytes;
use http::header::{HeaderMap, AUTHORIZATION};
use http_body_util::{BodyExt, Full};
use tracing::{debug, info, Level};

const REDACTED: &str = "<redacted>";

/// Renders headers as `name: value` pairs with credentials redacted.
#[must_use]
pub fn redacted_headers(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == AUTHORIZATION {
                REDACTED
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{name}: {value}")
        })
        .collect()
}

async fn body_text(body: &Full<Bytes>) -> String {
    let bytes = match body.clone().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Logs incoming requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLoggingFilter;

impl Filter for RequestLoggingFilter {
    fn name(&self) -> &'static str {
        "request_logging"
    }
}

impl RequestFilter for RequestLoggingFilter {
    fn filter_request<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a mut Request,
    ) -> BoxFuture<'a, FilterAction> {
        Box::pin(async move {
            if tracing::enabled!(Level::DEBUG) {
                let body = body_text(request.body()).await;
                debug!(
                    request_id = %ctx.request_id(),
                    method = %request.method(),
                    uri = %request.uri(),
                    headers = ?redacted_headers(request.headers()),
                    body = %body,
                    "Request received"
                );
            } else {
                info!(
                    request_id = %ctx.request_id(),
                    method = %request.method(),
                    uri = %request.uri(),
                    "Request received"
                );
            }
            FilterAction::Continue
        })
    }
}

/// Logs outgoing responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseLoggingFilter;

impl Filter for ResponseLoggingFilter {
    fn name(&self) -> &'static str {
        "response_logging"
    }
}

impl ResponseFilter for ResponseLoggingFilter {
    fn filter_response<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a RequestHead,
        response: &'a mut Response,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("");
            let duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);

            if tracing::enabled!(Level::DEBUG) {
                let body = body_text(response.body()).await;
                debug!(
                    request_id = %ctx.request_id(),
                    method = %request.method(),
                    path = request.path(),
                    status = status.as_u16(),
                    reason,
                    duration_ms,
                    headers = ?redacted_headers(response.headers()),
                    body = %body,
                    "Response sent"
                );
            } else {
                info!(
                    request_id = %ctx.request_id(),
                    method = %request.method(),
                    path = request.path(),
                    status = status.as_u16(),
                    reason,
                    duration_ms,
                    "Response sent"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use http::{HeaderValue, StatusCode};

    fn debug_subscriber() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[test]
    fn test_authorization_is_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret-token"));
        headers.insert("x-tenant", HeaderValue::from_static("t1"));

        let rendered = redacted_headers(&headers);

        assert!(rendered.contains(&"authorization: <redacted>".to_string()));
        assert!(rendered.contains(&"x-tenant: t1".to_string()));
        assert!(rendered.iter().all(|line| !line.contains("secret-token")));
    }

    #[tokio::test]
    async fn test_request_body_survives_debug_logging() {
        let _guard = debug_subscriber();
        let mut request = http::Request::post("/orders")
            .header(AUTHORIZATION, "Bearer secret-token")
            .body(Full::new(Bytes::from(r#"{"item":"book"}"#)))
            .unwrap();
        let mut ctx = FilterContext::new();

        let action = RequestLoggingFilter.filter_request(&mut ctx, &mut request).await;

        assert!(!action.is_abort());
        let body = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, r#"{"item":"book"}"#);
    }

    #[tokio::test]
    async fn test_response_untouched_by_logging() {
        let _guard = debug_subscriber();
        let head = RequestHead::from_request(&http::Request::get("/orders").body(()).unwrap());
        let mut response = Response::error(StatusCode::NOT_FOUND, "no such order");
        let mut ctx = FilterContext::new();

        ResponseLoggingFilter
            .filter_response(&mut ctx, &head, &mut response)
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "no such order");
    }

    #[tokio::test]
    async fn test_info_logging_without_subscriber() {
        let mut request = http::Request::get("/").body(Full::new(Bytes::new())).unwrap();
        let mut ctx = FilterContext::new();
        let action = RequestLoggingFilter.filter_request(&mut ctx, &mut request).await;
        assert!(!action.is_abort());
    }
}
