//! Request descriptors and response snapshots.
//!
//! These are the two halves of a cache entry. A [`RequestDescriptor`] is both
//! the lookup key and the argument to a network fetch; a [`ResponseSnapshot`]
//! is a fully buffered, immutable copy of a response that can be replayed
//! without touching the network.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    /// Whether requests with this method may be read from or written to the store.
    ///
    /// Only GET participates, matching the browser Cache API which refuses to
    /// store anything else.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(Error::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

/// A request identifying a resource to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// A GET request without headers, as used for preload entries.
    pub fn get(url: Url) -> Self {
        Self { method: Method::Get, url, headers: Vec::new() }
    }

    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: Vec::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// URL used for cache matching: the fragment never takes part in lookups.
    pub fn cache_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }
}

/// Origin classification of a response, as seen from the worker's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response with readable body.
    Cors,
    /// Cross-origin response without readable body.
    Opaque,
    /// Network error placeholder.
    Error,
    /// Synthesized locally, never fetched.
    Default,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Error => "error",
            Self::Default => "default",
        }
    }

    /// Whether a preload fetch of this type may be stored.
    ///
    /// Preload lists name cross-origin CDN assets on purpose, so only network
    /// errors and opaque bodies are excluded.
    pub fn is_preloadable(&self) -> bool {
        matches!(self, Self::Basic | Self::Cors | Self::Default)
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "cors" => Ok(Self::Cors),
            "opaque" => Ok(Self::Opaque),
            "error" => Ok(Self::Error),
            "default" => Ok(Self::Default),
            other => Err(Error::InvalidInput(format!("unknown response type: {other}"))),
        }
    }
}

/// Immutable, fully buffered copy of a response.
///
/// Cloning is cheap: the body is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub response_type: ResponseType,
}

impl ResponseSnapshot {
    /// True for any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the runtime fetch path may store this response.
    ///
    /// Only exact 200 same-origin responses qualify.
    pub fn is_storable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
