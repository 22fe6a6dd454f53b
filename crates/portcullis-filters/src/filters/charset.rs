//! Response charset normalization.

use crate::context::FilterContext;
use crate::filter::{Filter, ResponseFilter};
use crate::types::{BoxFuture, RequestHead, Response};
use http::header::{HeaderValue, CONTENT_TYPE};

/// Appends `; charset=<charset>` to a `Content-Type` that has no charset
/// parameter.
///
/// Responses without a `Content-Type` are left alone.
///
/// # Example
///
/// ```
/// use portcullis_filters::filters::CharsetFilter;
///
/// assert_eq!(
///     CharsetFilter::default().apply("application/json").as_deref(),
///     Some("application/json; charset=utf-8")
/// );
/// assert_eq!(CharsetFilter::default().apply("text/html; charset=latin1"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CharsetFilter {
    charset: String,
}

impl CharsetFilter {
    /// The charset used by [`CharsetFilter::default`].
    pub const DEFAULT_CHARSET: &'static str = "utf-8";

    /// Creates a filter appending `charset`.
    pub fn new(charset: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
        }
    }

    /// Returns the charset.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the rewritten content type, or `None` if `content_type`
    /// already names a charset.
    #[must_use]
    pub fn apply(&self, content_type: &str) -> Option<String> {
        let has_charset = content_type.split(';').skip(1).any(|param| {
            param
                .split('=')
                .next()
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("charset"))
        });

        if has_charset {
            None
        } else {
            Some(format!("{}; charset={}", content_type.trim_end(), self.charset))
        }
    }
}

impl Default for CharsetFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARSET)
    }
}

impl Filter for CharsetFilter {
    fn name(&self) -> &'static str {
        "charset"
    }
}

impl ResponseFilter for CharsetFilter {
    fn filter_response<'a>(
        &'a self,
        _ctx: &'a mut FilterContext,
        _request: &'a RequestHead,
        response: &'a mut Response,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let rewritten = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .and_then(|content_type| self.apply(content_type))
                .and_then(|content_type| HeaderValue::from_str(&content_type).ok());

            if let Some(value) = rewritten {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use http::StatusCode;

    fn head() -> RequestHead {
        RequestHead::from_request(&http::Request::get("/orders").body(()).unwrap())
    }

    async fn filtered(filter: &CharsetFilter, mut response: Response) -> Response {
        let mut ctx = FilterContext::new();
        filter.filter_response(&mut ctx, &head(), &mut response).await;
        response
    }

    #[tokio::test]
    async fn test_appends_default_charset() {
        let mut response = Response::empty(StatusCode::OK);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = filtered(&CharsetFilter::default(), response).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_keeps_existing_charset() {
        let mut response = Response::empty(StatusCode::OK);
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/csv; Charset=ISO-8859-1"),
        );

        let response = filtered(&CharsetFilter::new("utf-16"), response).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/csv; Charset=ISO-8859-1"
        );
    }

    #[tokio::test]
    async fn test_leaves_responses_without_content_type() {
        let response = filtered(&CharsetFilter::default(), Response::empty(StatusCode::NO_CONTENT)).await;
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_plain_text_errors_get_charset() {
        let response = Response::error(StatusCode::UNAUTHORIZED, "invalid credential");
        let response = filtered(&CharsetFilter::default(), response).await;
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_apply_with_other_parameters() {
        let filter = CharsetFilter::default();
        assert_eq!(
            filter.apply("multipart/form-data; boundary=xyz").as_deref(),
            Some("multipart/form-data; boundary=xyz; charset=utf-8")
        );
    }
}
