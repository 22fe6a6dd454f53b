//! Decoded token claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The decoded payload of a verified bearer token.
///
/// A `ClaimSet` is produced once per successful verification and is never
/// modified afterwards. Its entries are copied into the request's
/// [`ExecutionContext`](crate::ExecutionContext) by the authentication gate.
///
/// # Example
///
/// ```
/// use portcullis_core::ClaimSet;
/// use serde_json::json;
///
/// let claims: ClaimSet = [("tenant", json!("t1"))].into_iter().collect();
/// assert_eq!(claims.get("tenant"), Some(&json!("t1")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Creates a claim set from a decoded JSON object.
    #[must_use]
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Returns the value of a claim.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value of a string claim.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if the claim is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the token carried no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the claims in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consumes the claim set, returning the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_set_from_json_object() {
        let claims: ClaimSet =
            serde_json::from_value(json!({"sub": "alice", "tenant": "t1", "level": 3}))
                .expect("object should deserialize");

        assert_eq!(claims.len(), 3);
        assert_eq!(claims.get_str("sub"), Some("alice"));
        assert_eq!(claims.get("level"), Some(&json!(3)));
        assert!(claims.contains("tenant"));
        assert!(!claims.contains("missing"));
    }

    #[test]
    fn test_claim_set_rejects_non_object_payload() {
        let result: Result<ClaimSet, _> = serde_json::from_value(json!(["not", "an", "object"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_claim_set_get_str_on_non_string() {
        let claims: ClaimSet = [("level", json!(3))].into_iter().collect();
        assert_eq!(claims.get_str("level"), None);
    }

    #[test]
    fn test_empty_claim_set() {
        let claims = ClaimSet::default();
        assert!(claims.is_empty());
        assert_eq!(claims.iter().count(), 0);
    }
}
