//! `201 Created` annotation.

use crate::context::FilterContext;
use crate::filter::{Filter, ResponseFilter};
use crate::types::{BoxFuture, RequestHead, Response};
use http::StatusCode;

/// Rewrites successful responses of requests marked with
/// [`FilterContext::mark_created`] to `201 Created`.
///
/// Error responses keep their status.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatedStatusFilter;

impl Filter for CreatedStatusFilter {
    fn name(&self) -> &'static str {
        "created_status"
    }
}

impl ResponseFilter for CreatedStatusFilter {
    fn filter_response<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        _request: &'a RequestHead,
        response: &'a mut Response,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if ctx.is_created() && response.status().is_success() {
                *response.status_mut() = StatusCode::CREATED;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;

    async fn run(created: bool, status: StatusCode) -> StatusCode {
        let mut ctx = FilterContext::new();
        if created {
            ctx.mark_created();
        }
        let head = RequestHead::from_request(&http::Request::post("/orders").body(()).unwrap());
        let mut response = Response::empty(status);

        CreatedStatusFilter
            .filter_response(&mut ctx, &head, &mut response)
            .await;
        response.status()
    }

    #[tokio::test]
    async fn test_marked_success_becomes_created() {
        assert_eq!(run(true, StatusCode::OK).await, StatusCode::CREATED);
        assert_eq!(run(true, StatusCode::NO_CONTENT).await, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unmarked_response_untouched() {
        assert_eq!(run(false, StatusCode::OK).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_marked_error_keeps_status() {
        assert_eq!(run(true, StatusCode::CONFLICT).await, StatusCode::CONFLICT);
        assert_eq!(
            run(true, StatusCode::INTERNAL_SERVER_ERROR).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
