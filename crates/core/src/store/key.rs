//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key identifying a request.
///
/// The key is the hex SHA-256 of the HTTP method (uppercased, so `get` and
/// `GET` address the same entry) and the canonical absolute URL.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
