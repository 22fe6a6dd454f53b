//! End-to-end pipeline tests.
//!
//! These tests assemble the shipped filters at their default priorities and
//! drive requests through the whole chain:
//!
//! 1. Request logging
//! 2. CORS preflight interception
//! 3. Authentication
//! 4. Handler (or exception mapping)
//! 5. Created status, charset, CORS annotation, response logging

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use jsonwebtoken::{encode, EncodingKey, Header};
use portcullis_core::{AuthPolicy, CorsPolicy, ExecutionContext, Hs256Verifier, HttpError};
use portcullis_filters::filters::cors::headers;
use portcullis_filters::filters::{
    AuthenticationGate, CharsetFilter, CorsNegotiator, CreatedStatusFilter, RequestLoggingFilter,
    ResponseLoggingFilter,
};
use portcullis_filters::{
    priorities, BoxFuture, FilterContext, HandlerResult, Pipeline, Request, Response, ResponseExt,
};
use serde_json::json;
use std::sync::Arc;

const SECRET: &str = "e2e-secret";

fn build_pipeline() -> Pipeline {
    let cors = Arc::new(CorsNegotiator::new(
        CorsPolicy::new()
            .with_allow_origins(["https://a.com"])
            .with_allow_headers(["content-type", "authorization"]),
    ));
    let gate = AuthenticationGate::new(
        AuthPolicy::new(SECRET)
            .with_require_authorized(true)
            .with_exclude_paths(["/health"]),
        Arc::new(Hs256Verifier::new()),
    );

    Pipeline::builder()
        .response_filter(priorities::RESPONSE_LOGGING, Arc::new(ResponseLoggingFilter))
        .response_filter(priorities::CORS_ANNOTATION, cors.clone())
        .response_filter(priorities::ENTITY_CODER, Arc::new(CharsetFilter::default()))
        .response_filter(priorities::HEADER_DECORATOR, Arc::new(CreatedStatusFilter))
        .request_filter(priorities::AUTHENTICATION, Arc::new(gate))
        .request_filter(priorities::PREFLIGHT, cors)
        .request_filter(priorities::REQUEST_LOGGING, Arc::new(RequestLoggingFilter))
        .build()
}

fn token_for(tenant: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "tenant": tenant, "sub": format!("user-of-{tenant}") }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn make_request(method: Method, path: &str, authorization: Option<&str>) -> Request {
    let mut builder = http::Request::builder()
        .method(method)
        .uri(path)
        .header(headers::ORIGIN, "https://a.com");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Full::new(Bytes::new())).unwrap()
}

/// Echoes the tenant claim as JSON.
fn tenant_handler(ctx: &mut FilterContext, _request: Request) -> BoxFuture<'static, HandlerResult> {
    let tenant = ctx.execution().get_str("tenant").map(str::to_owned);
    Box::pin(async move {
        let body = json!({ "tenant": tenant }).to_string();
        let mut response = Response::text(StatusCode::OK, &body);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        Ok(response)
    })
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_authenticated_request_reaches_handler() {
    let pipeline = build_pipeline();
    let mut ctx = FilterContext::new();
    let request = make_request(
        Method::GET,
        "/orders",
        Some(&format!("Bearer {}", token_for("t1"))),
    );

    let response = pipeline.process(&mut ctx, request, tenant_handler).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(
        response.headers().get(headers::ALLOW_ORIGIN).unwrap(),
        "https://a.com"
    );
    assert_eq!(body_string(response).await, r#"{"tenant":"t1"}"#);
    assert_eq!(ctx.execution().get_str("sub"), Some("user-of-t1"));
}

#[tokio::test]
async fn test_missing_token_is_401_and_handler_skipped() {
    let pipeline = build_pipeline();
    let mut ctx = FilterContext::new();
    let request = make_request(Method::GET, "/orders", None);

    let response = pipeline
        .process(&mut ctx, request, |_ctx, _req| -> BoxFuture<'static, HandlerResult> {
            panic!("handler must not run")
        })
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert!(response.headers().get(headers::ALLOW_ORIGIN).is_none());
    assert_eq!(body_string(response).await, "missing or malformed credential");
    assert!(ctx.execution().is_empty());
}

#[tokio::test]
async fn test_forged_token_is_401() {
    let pipeline = build_pipeline();
    let mut ctx = FilterContext::new();
    let forged = encode(
        &Header::default(),
        &json!({ "tenant": "t1" }),
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();
    let request = make_request(Method::GET, "/orders", Some(&format!("Bearer {forged}")));

    let response = pipeline.process(&mut ctx, request, tenant_handler).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "invalid credential");
    assert!(ctx.execution().is_empty());
}

#[tokio::test]
async fn test_excluded_path_passes_with_malformed_header() {
    let pipeline = build_pipeline();
    let mut ctx = FilterContext::new();
    let request = make_request(Method::GET, "/health/live", Some("Token nonsense"));

    let response = pipeline.process(&mut ctx, request, tenant_handler).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"tenant":null}"#);
}

#[tokio::test]
async fn test_preflight_bypasses_authentication_and_handler() {
    let pipeline = build_pipeline();
    let mut ctx = FilterContext::new();
    let request = http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/orders")
        .header(headers::ORIGIN, "https://a.com")
        .header(headers::REQUEST_METHOD, "POST")
        .header(headers::REQUEST_HEADERS, "content-type")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let response = pipeline
        .process(&mut ctx, request, |_ctx, _req| -> BoxFuture<'static, HandlerResult> {
            panic!("handler must not run")
        })
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(headers::ALLOW_METHODS).unwrap(), "POST");
    assert_eq!(response.headers().get(headers::MAX_AGE).unwrap(), "10");
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn test_created_marker_and_handler_errors() {
    let pipeline = build_pipeline();
    let bearer = format!("Bearer {}", token_for("t1"));

    let mut ctx = FilterContext::new();
    let response = pipeline
        .process(
            &mut ctx,
            make_request(Method::POST, "/orders", Some(&bearer)),
            |ctx, _req| {
                ctx.mark_created();
                Box::pin(async { Ok::<_, anyhow::Error>(Response::text(StatusCode::OK, "created")) })
            },
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut ctx = FilterContext::new();
    let response = pipeline
        .process(
            &mut ctx,
            make_request(Method::POST, "/orders", Some(&bearer)),
            |ctx, _req| {
                ctx.mark_created();
                Box::pin(async {
                    Err::<Response, anyhow::Error>(HttpError::conflict("order exists").into())
                })
            },
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.headers().get(headers::ALLOW_ORIGIN).unwrap(),
        "https://a.com"
    );
    assert_eq!(body_string(response).await, "order exists");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_see_only_their_own_claims() {
    let pipeline = Arc::new(build_pipeline());

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let tenant = format!("tenant-{i}");
                let request = make_request(
                    Method::GET,
                    "/orders",
                    Some(&format!("Bearer {}", token_for(&tenant))),
                );
                let mut ctx = FilterContext::new();

                let response = pipeline
                    .process(&mut ctx, request, |_ctx, _req| {
                        Box::pin(async {
                            tokio::task::yield_now().await;
                            let seen = ExecutionContext::current("tenant")
                                .and_then(|v| v.as_str().map(str::to_owned))
                                .unwrap_or_default();
                            Ok::<_, anyhow::Error>(Response::text(StatusCode::OK, &seen))
                        })
                    })
                    .await;

                (tenant, body_string(response).await)
            })
        })
        .collect();

    for task in tasks {
        let (expected, seen) = task.await.unwrap();
        assert_eq!(seen, expected);
    }
}
