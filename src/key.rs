//! Key-generation strategies and store key hashing.
//!
//! A strategy derives a raw identity string from a [`RequestDescriptor`];
//! the raw string is hashed before it becomes a store key so raw addresses
//! and usernames never land in storage and key cardinality stays bounded.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::request::RequestDescriptor;

/// How the rate-limit key is derived from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Client address only. The simplest global per-client cap.
    ClientAddr,
    /// Client address plus method and path, giving each endpoint its own budget.
    Endpoint,
    /// Client address plus the lowercased attempted username, so credential
    /// stuffing is throttled per target account rather than per IP alone.
    Credential,
    /// Authenticated user id. Yields no key for unauthenticated requests,
    /// which the limiter treats as a skip.
    Principal,
}

impl KeyStrategy {
    /// Derive the raw (unhashed) key for a request.
    ///
    /// Returns `None` when the request carries no identity this strategy can
    /// use. Callers must not rate limit in that case.
    pub fn derive(&self, request: &RequestDescriptor) -> Option<String> {
        match self {
            KeyStrategy::ClientAddr => non_empty(request.client_addr.clone()),
            KeyStrategy::Endpoint => {
                non_empty(request.client_addr.clone())?;
                Some(format!(
                    "{}:{}:{}",
                    request.client_addr, request.method, request.path
                ))
            }
            KeyStrategy::Credential => {
                non_empty(request.client_addr.clone())?;
                match request.credential.as_deref() {
                    Some(user) if !user.is_empty() => {
                        Some(format!("{}:{}", request.client_addr, user.to_lowercase()))
                    }
                    // No username attempted: fall back to a per-address budget.
                    _ => Some(request.client_addr.clone()),
                }
            }
            KeyStrategy::Principal => request.principal.clone().and_then(non_empty),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Hash a raw derived key into the form stored in the backend.
///
/// SHA-256, truncated to 32 hex characters. Collisions at that width are not
/// a practical concern for throttling purposes.
pub fn hash_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(32);
    hex
}

/// Compose the final store key for a scope and raw derived key.
pub fn store_key(scope: &str, raw: &str) -> String {
    format!("{}:{}", scope, hash_key(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_addr_strategy() {
        let req = RequestDescriptor::new("1.2.3.4", "GET", "/a");
        assert_eq!(
            KeyStrategy::ClientAddr.derive(&req),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_client_addr_strategy_empty_address() {
        let req = RequestDescriptor::default();
        assert_eq!(KeyStrategy::ClientAddr.derive(&req), None);
    }

    #[test]
    fn test_endpoint_strategy_separates_paths() {
        let a = RequestDescriptor::new("1.2.3.4", "GET", "/a");
        let b = RequestDescriptor::new("1.2.3.4", "GET", "/b");

        let key_a = KeyStrategy::Endpoint.derive(&a).unwrap();
        let key_b = KeyStrategy::Endpoint.derive(&b).unwrap();
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_credential_strategy_lowercases_username() {
        let upper = RequestDescriptor::new("1.2.3.4", "POST", "/login").with_credential("Alice");
        let lower = RequestDescriptor::new("1.2.3.4", "POST", "/login").with_credential("alice");

        assert_eq!(
            KeyStrategy::Credential.derive(&upper),
            KeyStrategy::Credential.derive(&lower)
        );
    }

    #[test]
    fn test_credential_strategy_without_username_uses_address() {
        let req = RequestDescriptor::new("1.2.3.4", "POST", "/login");
        assert_eq!(
            KeyStrategy::Credential.derive(&req),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_principal_strategy_unauthenticated() {
        let req = RequestDescriptor::new("1.2.3.4", "GET", "/me");
        assert_eq!(KeyStrategy::Principal.derive(&req), None);
    }

    #[test]
    fn test_principal_strategy_ignores_address() {
        let a = RequestDescriptor::new("1.2.3.4", "GET", "/me").with_principal("user-7");
        let b = RequestDescriptor::new("5.6.7.8", "GET", "/me").with_principal("user-7");

        assert_eq!(
            KeyStrategy::Principal.derive(&a),
            KeyStrategy::Principal.derive(&b)
        );
    }

    #[test]
    fn test_hash_key_is_stable_and_truncated() {
        let first = hash_key("1.2.3.4");
        let second = hash_key("1.2.3.4");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert_ne!(first, hash_key("1.2.3.5"));
    }

    #[test]
    fn test_store_key_includes_scope() {
        let key = store_key("api", "1.2.3.4");
        assert!(key.starts_with("api:"));
        assert_eq!(key, format!("api:{}", hash_key("1.2.3.4")));
    }
}
