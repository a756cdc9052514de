//! Cache key generation.

use crate::types::RequestDescriptor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lookup identity for a snapshot: `(method, url)` hashed into a stable string.
///
/// The accept hint, headers and body are deliberately absent; two requests for
/// the same URL with different accept headers share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub method: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let method = method.into().to_uppercase();
        let url = url.into();
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b" ");
        hasher.update(url.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self { hash, method, url }
    }

    pub fn for_request(request: &RequestDescriptor) -> Self {
        Self::new(request.method.as_str(), request.url.as_str())
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_accept_hint() {
        let a = RequestDescriptor::get("http://localhost/api/data").unwrap();
        let b = a.clone().with_accept("text/html");
        assert_eq!(CacheKey::for_request(&a), CacheKey::for_request(&b));
    }

    #[test]
    fn test_key_distinguishes_method_and_query() {
        let get = CacheKey::new("get", "http://localhost/api/data");
        let post = CacheKey::new("POST", "http://localhost/api/data");
        let query = CacheKey::new("GET", "http://localhost/api/data?page=2");
        assert_ne!(get.hash, post.hash);
        assert_ne!(get.hash, query.hash);
        assert!(get.is_get());
        assert!(!post.is_get());
        assert_eq!(get.hash.len(), 64);
    }
}
