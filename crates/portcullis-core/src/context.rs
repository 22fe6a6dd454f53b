//! Request-scoped context types.
//!
//! Every in-flight request owns exactly one [`ExecutionContext`]. The
//! authentication gate writes the verified claims into it, and downstream code
//! reads them either through the filter context it is handed or, from deep
//! inside a handler future, through [`ExecutionContext::current`].
//!
//! There is no process-wide map: isolation between concurrent requests is
//! structural, one context value per request.

use crate::claims::ClaimSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use uuid::Uuid;

tokio::task_local! {
    static CURRENT: ExecutionContext;
}

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate.
///
/// # Example
///
/// ```
/// use portcullis_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Request-scoped key/value store.
///
/// Created empty when a request begins, populated by the authentication gate
/// on success, and dropped when the request finishes. Values are JSON values so
/// that any claim shape survives unchanged.
///
/// # Example
///
/// ```
/// use portcullis_core::ExecutionContext;
/// use serde_json::json;
///
/// let mut ctx = ExecutionContext::new();
/// ctx.set("tenant", "t1");
/// assert_eq!(ctx.get_str("tenant"), Some("t1"));
///
/// ctx.clear();
/// assert!(ctx.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    values: HashMap<String, Value>,
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value stored under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Removes every stored value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Copies every claim into the context.
    pub fn extend_from_claims(&mut self, claims: &ClaimSet) {
        self.values
            .extend(claims.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Runs `future` with `self` installed as the current task's context.
    ///
    /// Code running inside the future can read the context through
    /// [`ExecutionContext::current`] and [`ExecutionContext::with_current`]
    /// without it being passed explicitly. The context is dropped when the
    /// future completes.
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    /// Calls `f` with the context of the current task.
    ///
    /// Returns `None` when called outside of [`ExecutionContext::scope`].
    pub fn with_current<R>(f: impl FnOnce(&Self) -> R) -> Option<R> {
        CURRENT.try_with(f).ok()
    }

    /// Returns a clone of the value stored under `key` in the current task's
    /// context.
    #[must_use]
    pub fn current(key: &str) -> Option<Value> {
        Self::with_current(|ctx| ctx.get(key).cloned()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2, "Each RequestId should be unique");
    }

    #[test]
    fn test_request_id_display() {
        let display = RequestId::new().to_string();
        assert_eq!(display.len(), 36, "UUID string should be 36 characters");
    }

    #[test]
    fn test_request_id_from_uuid() {
        let uuid = Uuid::now_v7();
        let id = RequestId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_execution_context_set_get() {
        let mut ctx = ExecutionContext::new();
        ctx.set("tenant", "t1");
        ctx.set("level", 3);

        assert_eq!(ctx.get_str("tenant"), Some("t1"));
        assert_eq!(ctx.get("level"), Some(&json!(3)));
        assert_eq!(ctx.get_str("level"), None);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_execution_context_overwrite_and_remove() {
        let mut ctx = ExecutionContext::new();
        ctx.set("tenant", "t1");
        ctx.set("tenant", "t2");
        assert_eq!(ctx.get_str("tenant"), Some("t2"));

        assert_eq!(ctx.remove("tenant"), Some(json!("t2")));
        assert!(!ctx.contains("tenant"));
    }

    #[test]
    fn test_execution_context_extend_from_claims() {
        let claims: ClaimSet = [("sub", json!("alice")), ("roles", json!(["a", "b"]))]
            .into_iter()
            .collect();

        let mut ctx = ExecutionContext::new();
        ctx.extend_from_claims(&claims);

        assert_eq!(ctx.get_str("sub"), Some("alice"));
        assert_eq!(ctx.get("roles"), Some(&json!(["a", "b"])));
        let mut keys: Vec<_> = ctx.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["roles", "sub"]);
    }

    #[test]
    fn test_execution_context_clear() {
        let mut ctx = ExecutionContext::new();
        ctx.set("a", 1);
        ctx.clear();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_current_outside_scope_is_none() {
        assert!(ExecutionContext::current("tenant").is_none());
        assert!(ExecutionContext::with_current(ExecutionContext::len).is_none());
    }

    #[tokio::test]
    async fn test_scope_exposes_context_to_future() {
        let mut ctx = ExecutionContext::new();
        ctx.set("tenant", "t1");

        let seen = ctx
            .scope(async { ExecutionContext::current("tenant") })
            .await;

        assert_eq!(seen, Some(json!("t1")));
        assert!(ExecutionContext::current("tenant").is_none());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated_between_tasks() {
        let mut handles = Vec::new();
        for i in 0..16 {
            handles.push(tokio::spawn(async move {
                let mut ctx = ExecutionContext::new();
                ctx.set("tenant", format!("t{i}"));
                ctx.scope(async move {
                    tokio::task::yield_now().await;
                    (i, ExecutionContext::current("tenant"))
                })
                .await
            }));
        }

        for handle in handles {
            let (i, seen) = handle.await.expect("task should not panic");
            assert_eq!(seen, Some(json!(format!("t{i}"))));
        }
    }
}
