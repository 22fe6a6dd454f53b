//! Bearer token authentication.
//!
//! [`AuthenticationGate`] verifies the `Authorization: Bearer <token>` header
//! and copies every claim of a valid token into the request's
//! [`ExecutionContext`]. Requests are let through without verification when
//! authentication is not required, for `OPTIONS`, and for excluded paths.
//!
//! ```text
//! Unauthenticated ──(not required / OPTIONS / excluded)──▶ Passthrough
//!        │
//!        ├──(no "Bearer " credential)──────────────────▶ Rejected(MalformedCredential)
//!        ├──(verifier fails)───────────────────────────▶ Rejected(InvalidCredential)
//!        └──(verifier succeeds)────────────────────────▶ Authenticated
//! ```
//!
//! A rejected request ends with `401`, `Content-Type: text/plain` and a short
//! reason. The context is only written after a successful verification.

use crate::context::FilterContext;
use crate::filter::{Filter, FilterAction, RequestFilter};
use crate::types::{BoxFuture, Request, Response, ResponseExt};
use http::header::AUTHORIZATION;
use http::Method;
use portcullis_core::{AuthPolicy, ErrorCategory, ExecutionContext, TokenVerifier};
use portcullis_telemetry::metrics::record_auth_outcome;
use std::sync::Arc;
use tracing::{debug, warn, Level};

const BEARER_PREFIX: &str = "Bearer ";

/// Result of authenticating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Authentication did not apply to this request.
    Passthrough,
    /// The token was valid and its claims were published.
    Authenticated,
    /// The request must be refused.
    Rejected(ErrorCategory),
}

impl GateOutcome {
    /// Returns the label recorded in metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Authenticated => "authenticated",
            Self::Rejected(category) => category.as_str(),
        }
    }
}

/// Gate that verifies bearer tokens.
///
/// # Example
///
/// ```
/// use portcullis_core::{AuthPolicy, ExecutionContext, Hs256Verifier};
/// use portcullis_filters::filters::{AuthenticationGate, GateOutcome};
/// use std::sync::Arc;
///
/// let gate = AuthenticationGate::new(
///     AuthPolicy::new("secret").with_require_authorized(true),
///     Arc::new(Hs256Verifier::new()),
/// );
///
/// let request = http::Request::get("/orders").body(()).unwrap();
/// let mut execution = ExecutionContext::new();
///
/// assert!(matches!(
///     gate.authenticate(&request, &mut execution),
///     GateOutcome::Rejected(_)
/// ));
/// assert!(execution.is_empty());
/// ```
#[derive(Clone)]
pub struct AuthenticationGate {
    policy: Arc<AuthPolicy>,
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthenticationGate {
    /// Creates a gate from a policy and a verifier.
    pub fn new(policy: impl Into<Arc<AuthPolicy>>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            policy: policy.into(),
            verifier,
        }
    }

    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Authenticates `request`, writing the token's claims into `execution`
    /// on success.
    pub fn authenticate<B>(
        &self,
        request: &http::Request<B>,
        execution: &mut ExecutionContext,
    ) -> GateOutcome {
        let path = request.uri().path();

        if !self.policy.require_authorized()
            || request.method() == Method::OPTIONS
            || self.policy.is_excluded(path)
        {
            return GateOutcome::Passthrough;
        }

        let Some(token) = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        else {
            debug!(path, "Missing or malformed bearer credential");
            return GateOutcome::Rejected(ErrorCategory::MalformedCredential);
        };

        match self.verifier.verify(token, self.policy.secret_key()) {
            Ok(claims) => {
                execution.extend_from_claims(&claims);
                debug!(path, claims = claims.len(), "Bearer token accepted");
                GateOutcome::Authenticated
            }
            Err(error) => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!(path, error = ?error, "Bearer token rejected");
                } else {
                    warn!(error = %error, "Bearer token rejected");
                }
                GateOutcome::Rejected(ErrorCategory::InvalidCredential)
            }
        }
    }

    /// Builds the `401` response for a rejection.
    #[must_use]
    pub fn rejection_response(category: ErrorCategory) -> Response {
        Response::error(category.status_code(), category.reason())
    }
}

impl std::fmt::Debug for AuthenticationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationGate")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Filter for AuthenticationGate {
    fn name(&self) -> &'static str {
        "authentication"
    }
}

impl RequestFilter for AuthenticationGate {
    fn filter_request<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: &'a mut Request,
    ) -> BoxFuture<'a, FilterAction> {
        Box::pin(async move {
            let outcome = self.authenticate(request, ctx.execution_mut());
            record_auth_outcome(outcome.as_str());
            ctx.set_extension(outcome);

            match outcome {
                GateOutcome::Rejected(category) => {
                    FilterAction::Abort(Self::rejection_response(category))
                }
                GateOutcome::Passthrough | GateOutcome::Authenticated => FilterAction::Continue,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use portcullis_core::{ClaimSet, DecodeError, Hs256Verifier};
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;

    const SECRET: &str = "test-secret";

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_at(level: Level) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    /// Accepts exactly one token and returns fixed claims.
    struct StaticVerifier;

    impl TokenVerifier for StaticVerifier {
        fn verify(&self, token: &str, secret_key: &str) -> Result<ClaimSet, DecodeError> {
            if token == "good" && secret_key == SECRET {
                Ok([("tenant", json!("t1")), ("sub", json!("alice"))]
                    .into_iter()
                    .collect())
            } else {
                Err(DecodeError::InvalidSignature)
            }
        }
    }

    fn required_gate() -> AuthenticationGate {
        AuthenticationGate::new(
            AuthPolicy::new(SECRET)
                .with_require_authorized(true)
                .with_exclude_paths(["/public/"]),
            Arc::new(StaticVerifier),
        )
    }

    fn create_request(method: Method, path: &str, authorization: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[test]
    fn test_missing_authorization_is_rejected() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();

        let outcome = gate.authenticate(&create_request(Method::GET, "/orders", None), &mut execution);

        assert_eq!(outcome, GateOutcome::Rejected(ErrorCategory::MalformedCredential));
        assert!(execution.is_empty());
    }

    #[test]
    fn test_wrong_scheme_is_rejected() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();

        for value in ["Basic dXNlcjpwYXNz", "bearer good", "Bearergood"] {
            let outcome = gate.authenticate(
                &create_request(Method::GET, "/orders", Some(value)),
                &mut execution,
            );
            assert_eq!(
                outcome,
                GateOutcome::Rejected(ErrorCategory::MalformedCredential),
                "{value}"
            );
        }
        assert!(execution.is_empty());
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();

        let outcome = gate.authenticate(
            &create_request(Method::GET, "/orders", Some("Bearer forged")),
            &mut execution,
        );

        assert_eq!(outcome, GateOutcome::Rejected(ErrorCategory::InvalidCredential));
        assert!(execution.is_empty());
    }

    #[test]
    fn test_valid_token_publishes_claims() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();

        let outcome = gate.authenticate(
            &create_request(Method::GET, "/orders", Some("Bearer good")),
            &mut execution,
        );

        assert_eq!(outcome, GateOutcome::Authenticated);
        assert_eq!(execution.get_str("tenant"), Some("t1"));
        assert_eq!(execution.get_str("sub"), Some("alice"));
    }

    #[test]
    fn test_passthrough_when_not_required() {
        let gate = AuthenticationGate::new(AuthPolicy::new(SECRET), Arc::new(StaticVerifier));
        let mut execution = ExecutionContext::new();

        let outcome = gate.authenticate(
            &create_request(Method::GET, "/orders", Some("Bearer good")),
            &mut execution,
        );

        assert_eq!(outcome, GateOutcome::Passthrough);
        assert!(execution.is_empty());
    }

    #[test]
    fn test_passthrough_for_options_and_excluded_paths() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();

        let cases = [
            (Method::OPTIONS, "/orders"),
            (Method::GET, "/"),
            (Method::GET, "/index.html"),
            (Method::GET, "/index.htm"),
            (Method::GET, "/public/logo.png"),
        ];
        for (method, path) in cases {
            let outcome = gate.authenticate(
                &create_request(method.clone(), path, Some("Bearer forged")),
                &mut execution,
            );
            assert_eq!(outcome, GateOutcome::Passthrough, "{method} {path}");
        }
        assert!(execution.is_empty());
    }

    #[test]
    fn test_hs256_token_round_trip() {
        let gate = AuthenticationGate::new(
            AuthPolicy::new(SECRET).with_require_authorized(true),
            Arc::new(Hs256Verifier::new()),
        );
        let token = encode(
            &Header::default(),
            &json!({"tenant": "t9", "roles": ["admin"]}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let mut execution = ExecutionContext::new();

        let outcome = gate.authenticate(
            &create_request(Method::GET, "/orders", Some(&format!("Bearer {token}"))),
            &mut execution,
        );

        assert_eq!(outcome, GateOutcome::Authenticated);
        assert_eq!(execution.get_str("tenant"), Some("t9"));
        assert_eq!(execution.get("roles"), Some(&json!(["admin"])));
    }

    #[tokio::test]
    async fn test_filter_aborts_with_401_text_plain() {
        let gate = required_gate();
        let mut ctx = FilterContext::new();
        let mut request = create_request(Method::GET, "/orders", None);

        let FilterAction::Abort(response) = gate.filter_request(&mut ctx, &mut request).await else {
            panic!("missing credential should abort");
        };

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "missing or malformed credential");
        assert_eq!(
            ctx.get_extension::<GateOutcome>(),
            Some(&GateOutcome::Rejected(ErrorCategory::MalformedCredential))
        );
    }

    #[tokio::test]
    async fn test_filter_continues_for_valid_token() {
        let gate = required_gate();
        let mut ctx = FilterContext::new();
        let mut request = create_request(Method::GET, "/orders", Some("Bearer good"));

        let action = gate.filter_request(&mut ctx, &mut request).await;

        assert!(!action.is_abort());
        assert_eq!(ctx.execution().get_str("tenant"), Some("t1"));
    }

    #[test]
    fn test_rejection_logged_without_token_at_warn() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();
        let (logs, guard) = capture_at(Level::WARN);

        gate.authenticate(
            &create_request(Method::GET, "/orders", Some("Bearer forged-token-value")),
            &mut execution,
        );
        drop(guard);

        let output = logs.contents();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("Bearer token rejected"), "{output}");
        assert!(output.contains("invalid token signature"), "{output}");
        assert!(!output.contains("forged-token-value"), "{output}");
        assert!(!output.contains("/orders"), "{output}");
    }

    #[test]
    fn test_rejection_logged_in_full_at_debug() {
        let gate = required_gate();
        let mut execution = ExecutionContext::new();
        let (logs, guard) = capture_at(Level::DEBUG);

        gate.authenticate(
            &create_request(Method::GET, "/orders", Some("Bearer forged-token-value")),
            &mut execution,
        );
        drop(guard);

        let output = logs.contents();
        assert!(output.contains("DEBUG"), "{output}");
        assert!(!output.contains("WARN"), "{output}");
        assert!(output.contains("InvalidSignature"), "{output}");
        assert!(output.contains("/orders"), "{output}");
        assert!(!output.contains("forged-token-value"), "{output}");
    }

    #[test]
    fn test_debug_hides_secret() {
        let gate = required_gate();
        assert!(!format!("{gate:?}").contains(SECRET));
    }
}
