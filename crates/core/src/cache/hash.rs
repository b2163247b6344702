//! Request key generation for cache entries.

use sha2::{Digest, Sha256};

use crate::http::RequestDescriptor;

/// Compute the storage key for a request within a generation.
///
/// Only the method and the fragment-free URL take part; request headers do not.
pub fn compute_entry_key(request: &RequestDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(request.cache_url().as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use url::Url;

    fn request(method: Method, url: &str) -> RequestDescriptor {
        RequestDescriptor::new(method, Url::parse(url).unwrap())
    }

    #[test]
    fn test_key_stability() {
        let key1 = compute_entry_key(&request(Method::Get, "https://example.com/map.js"));
        let key2 = compute_entry_key(&request(Method::Get, "https://example.com/map.js"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_method() {
        let get = compute_entry_key(&request(Method::Get, "https://example.com/map.js"));
        let head = compute_entry_key(&request(Method::Head, "https://example.com/map.js"));
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_ignores_fragment_and_headers() {
        let plain = compute_entry_key(&request(Method::Get, "https://example.com/map.js"));
        let with_extras =
            compute_entry_key(&request(Method::Get, "https://example.com/map.js#L10").with_header("Accept", "*/*"));
        assert_eq!(plain, with_extras);
    }

    #[test]
    fn test_key_keeps_query() {
        let v1 = compute_entry_key(&request(Method::Get, "https://example.com/map.js?v=1"));
        let v2 = compute_entry_key(&request(Method::Get, "https://example.com/map.js?v=2"));
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_key_format() {
        let key = compute_entry_key(&request(Method::Get, "https://example.com"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
