//! # Portcullis
//!
//! **A filter chain for JSON APIs**
//!
//! Portcullis sits in front of request handlers and provides:
//!
//! - **CORS negotiation**: preflight answers and `Access-Control-Allow-Origin`
//!   on authorized responses
//! - **Bearer-token gate**: HS256 tokens verified per request, claims exposed
//!   through a request-scoped [`ExecutionContext`]
//! - **Response decoration**: default charset, `201 Created`, handler error
//!   mapping and request/response logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portcullis::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("PORTCULLIS").load()?;
//!     portcullis::telemetry::init_telemetry(&config.telemetry.to_telemetry_config())?;
//!
//!     let server = Server::builder()
//!         .config(config.server.clone())
//!         .pipeline(portcullis::standard_pipeline(&config, Arc::new(Hs256Verifier::new())))
//!         .handler(|_ctx, _req| Box::pin(async {
//!             let tenant = ExecutionContext::current("tenant");
//!             Ok(Response::text(StatusCode::OK, &format!("{tenant:?}")))
//!         }))
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → RequestLogging(900) → Preflight(950) → Authentication(1000) → Handler
//!                                                                            ↓
//! Response ← ResponseLogging(6000) ← CorsAnnotation(5100) ← Charset(4000) ← Created(3000)
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

pub use portcullis_config as config;
pub use portcullis_core as core;
pub use portcullis_filters as filters;
pub use portcullis_server as server;
pub use portcullis_telemetry as telemetry;

pub use portcullis_core::{ExecutionContext, TokenVerifier};

use portcullis_config::PortcullisConfig;
use portcullis_filters::filters::{
    AuthenticationGate, CharsetFilter, CorsNegotiator, CreatedStatusFilter, RequestLoggingFilter,
    ResponseLoggingFilter,
};
use portcullis_filters::{priorities, Pipeline};

/// Builds the standard pipeline from configuration.
///
/// | Filter | Side | Priority |
/// |--------|------|----------|
/// | [`RequestLoggingFilter`] | request | 900 |
/// | [`CorsNegotiator`] | request | 950 |
/// | [`AuthenticationGate`] | request | 1000 |
/// | [`CreatedStatusFilter`] | response | 3000 |
/// | [`CharsetFilter`] | response | 4000 |
/// | [`CorsNegotiator`] | response | 5100 |
/// | [`ResponseLoggingFilter`] | response | 6000 |
///
/// One negotiator instance serves both sides.
#[must_use]
pub fn standard_pipeline(config: &PortcullisConfig, verifier: Arc<dyn TokenVerifier>) -> Pipeline {
    let cors = Arc::new(CorsNegotiator::new(config.cors.to_policy()));
    let gate = AuthenticationGate::new(config.auth.to_policy(), verifier);

    Pipeline::builder()
        .request_filter(priorities::REQUEST_LOGGING, Arc::new(RequestLoggingFilter))
        .request_filter(priorities::PREFLIGHT, cors.clone())
        .request_filter(priorities::AUTHENTICATION, Arc::new(gate))
        .response_filter(priorities::HEADER_DECORATOR, Arc::new(CreatedStatusFilter))
        .response_filter(
            priorities::ENTITY_CODER,
            Arc::new(CharsetFilter::new(config.response.charset.clone())),
        )
        .response_filter(priorities::CORS_ANNOTATION, cors)
        .response_filter(priorities::RESPONSE_LOGGING, Arc::new(ResponseLoggingFilter))
        .build()
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use portcullis_config::{ConfigLoader, PortcullisConfig};
    pub use portcullis_core::{
        AuthPolicy, ClaimSet, CorsPolicy, ErrorCategory, ExecutionContext, Hs256Verifier,
        HttpError, RequestId, TokenVerifier, YearMonth,
    };
    pub use portcullis_filters::filters::{ErrorMapping, ExceptionMapper};
    pub use portcullis_filters::{
        BoxFuture, FilterContext, HandlerResult, Pipeline, Request, Response, ResponseExt,
    };
    pub use portcullis_server::{Server, ShutdownSignal};

    pub use crate::standard_pipeline;
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_core::Hs256Verifier;

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline =
            standard_pipeline(&PortcullisConfig::default(), Arc::new(Hs256Verifier::new()));

        assert_eq!(
            pipeline.request_filter_names(),
            ["request_logging", "cors", "authentication"]
        );
        assert_eq!(
            pipeline.response_filter_names(),
            ["created_status", "charset", "cors", "response_logging"]
        );
    }
}
