//! Request key generation.
//!
//! The store is addressed by method and canonical URL only. Query strings are
//! part of the key; fragments must already be stripped by the caller.

use sha2::{Digest, Sha256};

/// Normalized identity of a cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl RequestKey {
    /// Build a key for `method url`. The method is upper-cased before hashing.
    pub fn new(method: &str, url: &str) -> Self {
        let method = method.to_ascii_uppercase();
        let hash = compute_request_key(&method, url);
        Self { method, url: url.to_string(), hash }
    }

    /// Shorthand for the only method the store accepts.
    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }
}

/// Compute the SHA-256 request key for a method/URL pair.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
