//! Network fetch primitive used by the cache worker.
//!
//! ### Contract
//! - One attempt per call, no retries.
//! - Any HTTP status is a successful fetch; only transport failures are errors.
//! - Bodies are fully buffered (up to `max_bytes`) so responses can be stored
//!   and replayed.
//!
//! ### Origin classification
//! - Final URL shares scheme, host and port with the worker origin: `basic`.
//! - Anything else: `cors`.

pub mod error;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use mapcache_core::{AppConfig, Error, Method, RequestDescriptor, ResponseSnapshot, ResponseType};
use reqwest::{Client, Url};

pub use error::NetworkError;
pub use url::{UrlError, resolve, same_origin};

/// The network fetch primitive.
///
/// `fetch(descriptor) -> Response | NetworkError` with standard semantics.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, NetworkError>;
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "mapcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "mapcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed network bound to the worker's origin.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
    origin: Url,
}

impl HttpNetwork {
    /// Create a new network with the given configuration and worker origin.
    pub fn new(config: FetchConfig, origin: Url) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, origin })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Classify a response by its final URL.
    pub fn classify(&self, final_url: &Url) -> ResponseType {
        if same_origin(&self.origin, final_url) { ResponseType::Basic } else { ResponseType::Cors }
    }

    fn network_error(&self, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(self.config.timeout.as_millis() as u64)
        } else if err.is_connect() {
            NetworkError::Unreachable(err.to_string())
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Network(std::sync::Arc::new(err))
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, NetworkError> {
        let start = Instant::now();

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| self.network_error(e))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(NetworkError::TooLarge { len: len as usize, max: self.config.max_bytes });
        }

        let status = response.status();
        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| self.network_error(e))?;

        if body.len() > self.config.max_bytes {
            return Err(NetworkError::TooLarge { len: body.len(), max: self.config.max_bytes });
        }

        let response_type = self.classify(&final_url);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} {} ({}, {} bytes) in {}ms",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            response_type.as_str(),
            body.len(),
            fetch_ms
        );

        Ok(ResponseSnapshot {
            url: final_url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
            response_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a random localhost port.
    async fn serve_once(raw_response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let _ = socket.write_all(raw_response.as_bytes()).await;
            socket.shutdown().await.ok();
        });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn network_for(origin: &Url) -> HttpNetwork {
        HttpNetwork::new(FetchConfig::default(), origin.clone()).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "mapcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "test-agent".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_classify() {
        let origin = Url::parse("http://localhost:7000/").unwrap();
        let network = network_for(&origin);
        assert_eq!(network.classify(&origin.join("map.js").unwrap()), ResponseType::Basic);
        assert_eq!(
            network.classify(&Url::parse("https://api.mapbox.com/x.css").unwrap()),
            ResponseType::Cors
        );
    }

    #[tokio::test]
    async fn test_fetch_same_origin_ok() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 6\r\nConnection: close\r\n\r\nbody{}",
        )
        .await;
        let network = network_for(&url);

        let response = network.fetch(&RequestDescriptor::get(url.join("style.css").unwrap())).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.response_type, ResponseType::Basic);
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(&response.body[..], b"body{}");
        assert!(response.is_storable());
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_not_an_error() {
        let url =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let network = network_for(&url);

        let response = network.fetch(&RequestDescriptor::get(url.join("missing").unwrap())).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_cross_origin_is_cors() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok").await;
        let network = network_for(&Url::parse("http://localhost:7000/").unwrap());

        let response = network.fetch(&RequestDescriptor::get(url)).await.unwrap();
        assert_eq!(response.response_type, ResponseType::Cors);
        assert!(!response.is_storable());
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n0123456789").await;
        let config = FetchConfig { max_bytes: 4, ..Default::default() };
        let network = HttpNetwork::new(config, url.clone()).unwrap();

        let result = network.fetch(&RequestDescriptor::get(url)).await;
        assert!(matches!(result, Err(NetworkError::TooLarge { len: 10, max: 4 })));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let network = network_for(&url);

        let result = network.fetch(&RequestDescriptor::get(url)).await;
        assert!(matches!(result, Err(NetworkError::Unreachable(_)) | Err(NetworkError::Network(_))));
    }
}
