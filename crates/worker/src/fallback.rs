//! Synthetic response returned when a fetch cannot be answered at all.

use bytes::Bytes;
use mapcache_core::{ResponseSnapshot, ResponseType};
use url::Url;

pub const OFFLINE_MESSAGE: &str = "⚠️ Content could not be loaded. Check your internet connection.";

/// 503 plain-text response for a request that missed the cache while offline.
pub fn offline_response(url: &Url) -> ResponseSnapshot {
    ResponseSnapshot {
        url: url.clone(),
        status: 503,
        status_text: "Service Unavailable".to_string(),
        headers: vec![("Content-Type".to_string(), "text/plain; charset=utf-8".to_string())],
        body: Bytes::from_static(OFFLINE_MESSAGE.as_bytes()),
        response_type: ResponseType::Default,
    }
}
