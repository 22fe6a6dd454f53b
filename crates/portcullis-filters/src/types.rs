//! Common types used throughout the filter pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;

/// The HTTP request type used in the pipeline.
///
/// This is a standard `http::Request` with a fully collected body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future returned by filters and handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What an application handler produces.
///
/// Errors are turned into responses by the
/// [`ExceptionMapper`](crate::filters::ExceptionMapper).
pub type HandlerResult = Result<Response, anyhow::Error>;

/// Snapshot of a request's method, URI, version and headers.
///
/// Response filters receive this instead of the request, whose body has
/// already been handed to the handler.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
}

impl RequestHead {
    /// Copies the head of `request`.
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
        }
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the HTTP version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Extension trait for building plain responses.
pub trait ResponseExt {
    /// Creates a `text/plain` response with the given status and body.
    fn text(status: StatusCode, body: &str) -> Response;

    /// Creates a `text/plain` error response carrying `message`.
    fn error(status: StatusCode, message: &str) -> Response {
        Self::text(status, message)
    }

    /// Creates a response with the given status and no body or headers.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(body.to_owned())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }
}
