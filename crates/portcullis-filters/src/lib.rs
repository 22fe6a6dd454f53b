//! # Portcullis Filters
//!
//! Priority-ordered request/response filter pipeline.
//!
//! A [`Pipeline`] holds two independently sorted lists of filters. Request
//! filters run before the handler and may abort the request with a terminal
//! response. Response filters always run, whether the response came from the
//! handler, from an aborting filter, or from the [`ExceptionMapper`] after a
//! handler error.
//!
//! ```text
//! Request → RequestLogging(900) → CORS preflight(950) → Authentication(1000) → Handler
//!                                                                                 ↓
//! Response ← ResponseLogging(6000) ← CORS(5100) ← Charset(4000) ← Created(3000) ←─┘
//! ```
//!
//! ## Example
//!
//! ```
//! use portcullis_core::{AuthPolicy, CorsPolicy, Hs256Verifier};
//! use portcullis_filters::filters::{AuthenticationGate, CharsetFilter, CorsNegotiator};
//! use portcullis_filters::{priorities, Pipeline};
//! use std::sync::Arc;
//!
//! let cors = Arc::new(CorsNegotiator::new(CorsPolicy::new()));
//! let gate = AuthenticationGate::new(AuthPolicy::new("secret"), Arc::new(Hs256Verifier::new()));
//!
//! let pipeline = Pipeline::builder()
//!     .request_filter(priorities::AUTHENTICATION, Arc::new(gate))
//!     .request_filter(priorities::PREFLIGHT, cors.clone())
//!     .response_filter(priorities::CORS_ANNOTATION, cors)
//!     .response_filter(priorities::ENTITY_CODER, Arc::new(CharsetFilter::default()))
//!     .build();
//!
//! assert_eq!(pipeline.request_filter_names(), ["cors", "authentication"]);
//! assert_eq!(pipeline.response_filter_names(), ["charset", "cors"]);
//! ```
//!
//! [`ExceptionMapper`]: filters::ExceptionMapper

#![doc(html_root_url = "https://docs.rs/portcullis-filters/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod filter;
pub mod filters;
pub mod pipeline;
pub mod priorities;
pub mod types;

pub use context::FilterContext;
pub use filter::{Filter, FilterAction, RequestFilter, ResponseFilter};
pub use pipeline::{BoxedRequestFilter, BoxedResponseFilter, Pipeline, PipelineBuilder};
pub use types::{BoxFuture, HandlerResult, Request, RequestHead, Response, ResponseExt};
