//! Immutable request policies.
//!
//! Policies are built once at startup and shared by every request through an
//! `Arc`. Nothing mutates them afterwards, so no locking is involved.
//!
//! # Wildcards
//!
//! For each CORS allow-list, an empty list and a list whose first entry is
//! `"*"` both mean "no restriction". A policy that forbids everything cannot
//! be expressed.

/// Wildcard sentinel for allow-lists.
const WILDCARD: &str = "*";

/// Paths that never require authentication.
const ALWAYS_EXCLUDED: [&str; 4] = ["", "/", "/index.html", "/index.htm"];

fn lowercase_all<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_lowercase())
        .collect()
}

fn is_unrestricted(list: &[String]) -> bool {
    list.first().map_or(true, |first| first == WILDCARD)
}

/// Cross-origin resource sharing policy.
///
/// All allow-lists are lower-cased on construction.
///
/// # Example
///
/// ```
/// use portcullis_core::CorsPolicy;
///
/// let policy = CorsPolicy::new()
///     .with_allow_origins(["https://a.com"])
///     .with_allow_headers(["Content-Type"]);
///
/// assert!(policy.allows_origin("https://a.com"));
/// assert!(!policy.allows_origin("https://evil.com"));
/// assert!(policy.allows_request_headers(Some("content-type")));
/// assert_eq!(policy.max_age_seconds(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
    max_age_seconds: i64,
}

impl CorsPolicy {
    /// Default preflight cache duration in seconds.
    pub const DEFAULT_MAX_AGE_SECONDS: i64 = 10;

    /// Creates an unrestricted policy with the default max age.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_origins: Vec::new(),
            allow_methods: Vec::new(),
            allow_headers: Vec::new(),
            max_age_seconds: Self::DEFAULT_MAX_AGE_SECONDS,
        }
    }

    /// Sets the permitted origins.
    #[must_use]
    pub fn with_allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow_origins = lowercase_all(origins);
        self
    }

    /// Sets the permitted methods.
    #[must_use]
    pub fn with_allow_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow_methods = lowercase_all(methods);
        self
    }

    /// Sets the permitted request headers.
    #[must_use]
    pub fn with_allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allow_headers = lowercase_all(headers);
        self
    }

    /// Sets the preflight cache duration. Values `<= 0` disable the
    /// `Access-Control-Max-Age` header.
    #[must_use]
    pub const fn with_max_age_seconds(mut self, seconds: i64) -> Self {
        self.max_age_seconds = seconds;
        self
    }

    /// Returns the permitted origins.
    #[must_use]
    pub fn allow_origins(&self) -> &[String] {
        &self.allow_origins
    }

    /// Returns the permitted methods.
    #[must_use]
    pub fn allow_methods(&self) -> &[String] {
        &self.allow_methods
    }

    /// Returns the permitted request headers.
    #[must_use]
    pub fn allow_headers(&self) -> &[String] {
        &self.allow_headers
    }

    /// Returns the preflight cache duration.
    #[must_use]
    pub const fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    /// Returns `true` if the origin is permitted.
    ///
    /// The origin is compared exactly as provided, so an origin with upper-case
    /// characters never matches a restricted list.
    #[must_use]
    pub fn allows_origin(&self, origin: &str) -> bool {
        is_unrestricted(&self.allow_origins) || self.allow_origins.iter().any(|o| o == origin)
    }

    /// Returns `true` if the method is permitted. Methods compare
    /// case-insensitively.
    #[must_use]
    pub fn allows_method(&self, method: &str) -> bool {
        is_unrestricted(&self.allow_methods)
            || self
                .allow_methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Returns `true` if every token of an `Access-Control-Request-Headers`
    /// value is permitted.
    ///
    /// Tokens are split on commas, trimmed and lower-cased. An absent value
    /// requests no headers and is always permitted.
    #[must_use]
    pub fn allows_request_headers(&self, requested: Option<&str>) -> bool {
        if is_unrestricted(&self.allow_headers) {
            return true;
        }
        requested.map_or(true, |value| {
            value
                .split(',')
                .map(|token| token.trim().to_ascii_lowercase())
                .filter(|token| !token.is_empty())
                .all(|token| self.allow_headers.contains(&token))
        })
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Bearer-token authentication policy.
///
/// `Debug` output never includes the secret key.
///
/// # Example
///
/// ```
/// use portcullis_core::AuthPolicy;
///
/// let policy = AuthPolicy::new("s3cret")
///     .with_require_authorized(true)
///     .with_exclude_paths(["/static/"]);
///
/// assert!(policy.is_excluded("/"));
/// assert!(policy.is_excluded("/static/app.js"));
/// assert!(!policy.is_excluded("/orders"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AuthPolicy {
    secret_key: String,
    require_authorized: bool,
    exclude_path_prefixes: Vec<String>,
}

impl AuthPolicy {
    /// Secret key used when none is configured.
    pub const DEFAULT_SECRET_KEY: &'static str = "test";

    /// Creates a policy with the given secret key. Authentication is not
    /// required until [`with_require_authorized`](Self::with_require_authorized)
    /// enables it.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            require_authorized: false,
            exclude_path_prefixes: Vec::new(),
        }
    }

    /// Sets whether requests must carry a valid bearer token.
    #[must_use]
    pub const fn with_require_authorized(mut self, required: bool) -> Self {
        self.require_authorized = required;
        self
    }

    /// Sets the path prefixes that bypass authentication.
    #[must_use]
    pub fn with_exclude_paths<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_path_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the verification secret.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Returns `true` if requests must carry a valid bearer token.
    #[must_use]
    pub const fn require_authorized(&self) -> bool {
        self.require_authorized
    }

    /// Returns the configured exclusion prefixes.
    #[must_use]
    pub fn exclude_path_prefixes(&self) -> &[String] {
        &self.exclude_path_prefixes
    }

    /// Returns `true` if `path` bypasses authentication.
    ///
    /// The root, `/index.html` and `/index.htm` are always excluded, as is any
    /// path starting with a configured prefix.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        ALWAYS_EXCLUDED.contains(&path)
            || self
                .exclude_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SECRET_KEY)
    }
}

impl std::fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPolicy")
            .field("secret_key", &"<redacted>")
            .field("require_authorized", &self.require_authorized)
            .field("exclude_path_prefixes", &self.exclude_path_prefixes)
            .finish()
    }
}
