//! URL resolution for preload entries and intercepted requests.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a possibly relative URL against the worker scope.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs (containing `://`) are parsed as-is, anything else joins `base`
/// 3. Only http and https are accepted
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    } else {
        base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_dot_slash_at_root() {
        let url = resolve(&base("http://localhost:7000/"), "./").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7000/");
    }

    #[test]
    fn test_resolve_dot_slash_under_sub_path() {
        let url = resolve(&base("https://libyan-workers.github.io/app/"), "./").unwrap();
        assert_eq!(url.as_str(), "https://libyan-workers.github.io/app/");
    }

    #[test]
    fn test_resolve_root_relative_ignores_base_path() {
        let url = resolve(&base("https://libyan-workers.github.io/app/"), "/").unwrap();
        assert_eq!(url.as_str(), "https://libyan-workers.github.io/");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = resolve(
            &base("http://localhost:7000/"),
            "https://api.mapbox.com/mapbox-gl-js/v2.14.1/mapbox-gl.css",
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("api.mapbox.com"));
        assert_eq!(url.path(), "/mapbox-gl-js/v2.14.1/mapbox-gl.css");
    }

    #[test]
    fn test_resolve_lowercases_host() {
        let url = resolve(&base("http://localhost:7000/"), "https://API.MAPBOX.COM/x.js").unwrap();
        assert_eq!(url.host_str(), Some("api.mapbox.com"));
    }

    #[test]
    fn test_resolve_removes_fragment_keeps_query() {
        let url = resolve(&base("http://localhost:7000/"), "map.js?v=2#top").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7000/map.js?v=2");
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        let url = resolve(&base("http://localhost:7000/"), "  index.html  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7000/index.html");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&base("http://localhost:7000/"), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&base("http://localhost:7000/"), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&base("http://localhost:7000/"), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let page = base("http://localhost:7000/");
        assert!(same_origin(&page, &base("http://localhost:7000/map.js")));
        assert!(!same_origin(&page, &base("http://localhost:7001/map.js")));
        assert!(!same_origin(&page, &base("https://localhost:7000/map.js")));
        assert!(!same_origin(&page, &base("https://api.mapbox.com/x.css")));
    }
}
