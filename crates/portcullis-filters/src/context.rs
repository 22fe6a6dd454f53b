//! Per-request filter context.
//!
//! A [`FilterContext`] is created for every request and dropped when the
//! response has been produced. It owns the request's [`ExecutionContext`],
//! so values written by one request are never visible to another.

use portcullis_core::{ExecutionContext, RequestId};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// State that flows through the filter pipeline for one request.
///
/// # Example
///
/// ```
/// use portcullis_filters::FilterContext;
///
/// let mut ctx = FilterContext::new();
/// ctx.execution_mut().set("tenant", "t1");
/// ctx.mark_created();
///
/// assert_eq!(ctx.execution().get_str("tenant"), Some("t1"));
/// assert!(ctx.is_created());
/// ```
#[derive(Debug)]
pub struct FilterContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Values published by authentication for downstream code.
    execution: ExecutionContext,

    /// Set by handlers that created a resource.
    created: bool,

    /// When the request entered the pipeline.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl FilterContext {
    /// Creates a context with a fresh request ID and an empty execution context.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            execution: ExecutionContext::new(),
            created: false,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request's execution context.
    #[must_use]
    pub fn execution(&self) -> &ExecutionContext {
        &self.execution
    }

    /// Returns the request's execution context for writing.
    pub fn execution_mut(&mut self) -> &mut ExecutionContext {
        &mut self.execution
    }

    /// Marks the request as having created a resource.
    ///
    /// A successful response is then sent with status `201 Created`.
    pub fn mark_created(&mut self) {
        self.created = true;
    }

    /// Returns `true` if [`mark_created`](Self::mark_created) was called.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time spent since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new()
    }
}
