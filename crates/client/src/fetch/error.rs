//! Network fetch error types.

use std::sync::Arc;

use mapcache_core::Error;

/// Errors from the network fetch primitive.
///
/// HTTP error statuses are not errors here: a 404 is a successful fetch of a
/// 404 response. Only failures to obtain any response end up in this type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Request did not complete within the configured timeout.
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Transport level failure reported by the HTTP client.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Host unreachable or offline.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// Response body exceeded the configured limit.
    #[error("response too large: {len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },

    /// Request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Timeout(_) => Error::FetchTimeout(err.to_string()),
            NetworkError::TooLarge { .. } => Error::FetchTooLarge(err.to_string()),
            NetworkError::InvalidRequest(msg) => Error::InvalidInput(msg),
            NetworkError::Network(_) | NetworkError::Unreachable(_) => Error::HttpError(err.to_string()),
        }
    }
}
