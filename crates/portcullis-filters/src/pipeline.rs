//! Priority-ordered filter pipeline.
//!
//! Filters are registered with an integer priority and sorted once, when the
//! pipeline is built. For every request the pipeline:
//!
//! 1. Runs the request filters in ascending priority until one aborts
//! 2. Runs the handler, unless a request filter aborted, mapping a handler
//!    error to a response through the [`ExceptionMapper`]
//! 3. Runs every response filter in ascending priority, whatever happened
//!    before
//!
//! Filters with equal priority keep their registration order.

use crate::context::FilterContext;
use crate::filter::{FilterAction, RequestFilter, ResponseFilter};
use crate::filters::ExceptionMapper;
use crate::types::{BoxFuture, HandlerResult, Request, RequestHead, Response};
use std::sync::Arc;
use tracing::debug;

/// A request filter stored in the pipeline.
pub type BoxedRequestFilter = Arc<dyn RequestFilter>;

/// A response filter stored in the pipeline.
pub type BoxedResponseFilter = Arc<dyn ResponseFilter>;

/// An immutable, sorted filter chain.
///
/// A pipeline is built once at startup and shared by all requests.
///
/// # Example
///
/// ```
/// use portcullis_filters::filters::{CharsetFilter, CreatedStatusFilter};
/// use portcullis_filters::{priorities, Pipeline};
/// use std::sync::Arc;
///
/// let pipeline = Pipeline::builder()
///     .response_filter(priorities::ENTITY_CODER, Arc::new(CharsetFilter::default()))
///     .response_filter(priorities::HEADER_DECORATOR, Arc::new(CreatedStatusFilter))
///     .build();
///
/// assert_eq!(pipeline.response_filter_names(), ["created_status", "charset"]);
/// ```
pub struct Pipeline {
    request_filters: Vec<(i32, BoxedRequestFilter)>,
    response_filters: Vec<(i32, BoxedResponseFilter)>,
    exception_mapper: ExceptionMapper,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes one request through the pipeline.
    ///
    /// The handler receives the context after the request filters ran and
    /// returns a `'static` future. That future runs inside the request's
    /// [`ExecutionContext`](portcullis_core::ExecutionContext) scope, so code
    /// it calls can use [`ExecutionContext::current`](portcullis_core::ExecutionContext::current).
    pub async fn process<H>(
        &self,
        ctx: &mut FilterContext,
        mut request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, HandlerResult> + Send,
    {
        let mut aborted = None;
        for (priority, filter) in &self.request_filters {
            if let FilterAction::Abort(response) = filter.filter_request(ctx, &mut request).await {
                debug!(
                    request_id = %ctx.request_id(),
                    filter = filter.name(),
                    priority = *priority,
                    status = response.status().as_u16(),
                    "Request aborted by filter"
                );
                aborted = Some(response);
                break;
            }
        }

        let head = RequestHead::from_request(&request);

        let mut response = match aborted {
            Some(response) => response,
            None => {
                let scope = ctx.execution().clone();
                let future = handler(&mut *ctx, request);
                match scope.scope(future).await {
                    Ok(response) => response,
                    Err(error) => self.exception_mapper.to_response(&error),
                }
            }
        };

        for (_, filter) in &self.response_filters {
            filter.filter_response(ctx, &head, &mut response).await;
        }

        response
    }

    /// Returns the request filter names in execution order.
    #[must_use]
    pub fn request_filter_names(&self) -> Vec<&'static str> {
        self.request_filters.iter().map(|(_, f)| f.name()).collect()
    }

    /// Returns the response filter names in execution order.
    #[must_use]
    pub fn response_filter_names(&self) -> Vec<&'static str> {
        self.response_filters.iter().map(|(_, f)| f.name()).collect()
    }

    /// Returns the total number of registered filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.request_filters.len() + self.response_filters.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request_filters", &self.request_filter_names())
            .field("response_filters", &self.response_filter_names())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    request_filters: Vec<(i32, BoxedRequestFilter)>,
    response_filters: Vec<(i32, BoxedResponseFilter)>,
    exception_mapper: Option<ExceptionMapper>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request filter.
    #[must_use]
    pub fn request_filter(mut self, priority: i32, filter: BoxedRequestFilter) -> Self {
        self.request_filters.push((priority, filter));
        self
    }

    /// Registers a response filter.
    #[must_use]
    pub fn response_filter(mut self, priority: i32, filter: BoxedResponseFilter) -> Self {
        self.response_filters.push((priority, filter));
        self
    }

    /// Sets the mapper used for handler errors.
    ///
    /// Defaults to [`ExceptionMapper::new`].
    #[must_use]
    pub fn exception_mapper(mut self, mapper: ExceptionMapper) -> Self {
        self.exception_mapper = Some(mapper);
        self
    }

    /// Sorts the filters and builds the pipeline.
    #[must_use]
    pub fn build(mut self) -> Pipeline {
        self.request_filters.sort_by_key(|(priority, _)| *priority);
        self.response_filters.sort_by_key(|(priority, _)| *priority);

        Pipeline {
            request_filters: self.request_filters,
            response_filters: self.response_filters,
            exception_mapper: self.exception_mapper.unwrap_or_default(),
        }
    }
}
