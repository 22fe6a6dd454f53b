//! Filter traits.
//!
//! A filter is registered on one side of the [`Pipeline`](crate::Pipeline):
//!
//! - a [`RequestFilter`] runs before the handler and may end the request
//!   early by returning [`FilterAction::Abort`]
//! - a [`ResponseFilter`] runs after the handler (or after an abort) and
//!   edits the outgoing response in place
//!
//! Filter instances are shared by every in-flight request. They must keep
//! per-request state in the [`FilterContext`], never in `self`.
//!
//! # Example
//!
//! ```
//! use portcullis_filters::{BoxFuture, Filter, FilterAction, FilterContext, Request, RequestFilter};
//!
//! struct RequireJson;
//!
//! impl Filter for RequireJson {
//!     fn name(&self) -> &'static str {
//!         "require_json"
//!     }
//! }
//!
//! impl RequestFilter for RequireJson {
//!     fn filter_request<'a>(
//!         &'a self,
//!         _ctx: &'a mut FilterContext,
//!         _request: &'a mut Request,
//!     ) -> BoxFuture<'a, FilterAction> {
//!         Box::pin(async { FilterAction::Continue })
//!     }
//! }
//! ```

use crate::context::FilterContext;
use crate::types::{BoxFuture, Request, RequestHead, Response};

/// Common behavior of every filter.
pub trait Filter: Send + Sync + 'static {
    /// Returns the filter name, used in logs.
    fn name(&self) -> &'static str;
}

/// Decision returned by a [`RequestFilter`].
#[derive(Debug)]
pub enum FilterAction {
    /// Hand the request to the next filter, or the handler.
    Continue,
    /// Skip the remaining request filters and the handler and answer with
    /// this response. Response filters still run.
    Abort(Response),
}

impl FilterAction {
    /// Returns `true` for [`FilterAction::Abort`].
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort(_))
    }
}

/// A filter that inspects, and may rewrite or reject, incoming requests.
pub trait RequestFilter: Filter {
    /// Filters one request.
    fn filter_request<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a mut Request,
    ) -> BoxFuture<'a, FilterAction>;
}

/// A filter that edits outgoing responses.
pub trait ResponseFilter: Filter {
    /// Filters one response.
    ///
    /// `request` is a snapshot of the request taken after the request
    /// filters ran.
    fn filter_response<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a RequestHead,
        response: &'a mut Response,
    ) -> BoxFuture<'a, ()>;
}
