//! worker_fetch tool implementation.
//!
//! Delivers one request to the worker. When the worker passes the request
//! through, the host performs the fetch itself, as a browser would without a
//! controlling worker.

use std::collections::BTreeMap;

use mapcache_client::Network;
use mapcache_core::{Method, RequestDescriptor, ResponseSnapshot};
use mapcache_worker::{CacheManager, FetchOutcome};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;
use crate::error::HostError;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute http(s) URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    pub method: Option<String>,

    /// Request headers.
    pub headers: Option<BTreeMap<String, String>>,
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub body: String,
    pub body_bytes: usize,
    pub response_type: String,

    /// One of `cache`, `network`, `fallback`, `passthrough`.
    pub source: String,
}

impl WorkerFetchOutput {
    fn new(response: &ResponseSnapshot, source: &str) -> Self {
        Self {
            url: response.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
            response_type: response.response_type.as_str().to_string(),
            source: source.to_string(),
        }
    }
}

fn build_request(params: &WorkerFetchParams) -> Result<RequestDescriptor, McpError> {
    let url = Url::parse(params.url.trim()).map_err(|e| HostError::InvalidInput(format!("invalid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HostError::InvalidInput(format!("unsupported scheme: {}", url.scheme())).into());
    }

    let method = match params.method.as_deref() {
        Some(m) => m.parse::<Method>()?,
        None => Method::Get,
    };

    let mut request = RequestDescriptor::new(method, url);
    for (name, value) in params.headers.iter().flatten() {
        request = request.with_header(name, value);
    }
    Ok(request)
}

pub async fn fetch_impl<N: Network + 'static>(
    manager: &CacheManager<N>, params: WorkerFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(&params)?;

    let output = match manager.on_fetch(&request).await {
        FetchOutcome::Respond { response, source } => WorkerFetchOutput::new(&response, source.as_str()),
        FetchOutcome::Passthrough => {
            let response = manager
                .network()
                .fetch(&request)
                .await
                .map_err(|e| HostError::PassthroughFailed(e.to_string()))?;
            WorkerFetchOutput::new(&response, "passthrough")
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::{activate_impl, install_impl};
    use crate::tools::testing::{ORIGIN, StubNetwork, manager, output_json};

    fn params(url: &str, method: Option<&str>) -> WorkerFetchParams {
        WorkerFetchParams { url: url.to_string(), method: method.map(str::to_string), headers: None }
    }

    #[test]
    fn test_build_request_defaults_to_get() {
        let request = build_request(&params(ORIGIN, None)).unwrap();
        assert_eq!(request.method, Method::Get);
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_build_request_with_headers() {
        let mut p = params(ORIGIN, Some("post"));
        p.headers = Some(BTreeMap::from([("Accept".to_string(), "text/html".to_string())]));

        let request = build_request(&p).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.headers, vec![("Accept".to_string(), "text/html".to_string())]);
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        assert!(build_request(&params("not a url", None)).is_err());
        assert!(build_request(&params("ftp://example.com/", None)).is_err());
        assert!(build_request(&params(ORIGIN, Some("BREW"))).is_err());
    }

    #[tokio::test]
    async fn test_fetch_before_activation_is_passthrough() {
        let (manager, network) = manager(StubNetwork::with(&[(ORIGIN, "<html>")]), &[]).await;

        let output = output_json(&fetch_impl(&manager, params(ORIGIN, None)).await.unwrap());

        assert_eq!(output["source"], "passthrough");
        assert_eq!(output["body"], "<html>");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_served_from_cache_after_install() {
        let (manager, network) = manager(StubNetwork::with(&[(ORIGIN, "<html>")]), &["./"]).await;
        install_impl(&manager).await.unwrap();
        activate_impl(&manager).await.unwrap();

        let output = output_json(&fetch_impl(&manager, params(ORIGIN, None)).await.unwrap());

        assert_eq!(output["source"], "cache");
        assert_eq!(output["status"], 200);
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_offline_returns_fallback() {
        let (manager, _) = manager(StubNetwork::default(), &[]).await;
        install_impl(&manager).await.unwrap();
        activate_impl(&manager).await.unwrap();

        let output = output_json(&fetch_impl(&manager, params("http://localhost:7000/map.js", None)).await.unwrap());

        assert_eq!(output["source"], "fallback");
        assert_eq!(output["status"], 503);
        assert!(!output["body"].as_str().unwrap_or("").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_head_offline_returns_fallback() {
        let (manager, _) = manager(StubNetwork::default(), &[]).await;
        install_impl(&manager).await.unwrap();
        activate_impl(&manager).await.unwrap();

        let head = params("http://localhost:7000/map.js", Some("HEAD"));
        let output = output_json(&fetch_impl(&manager, head).await.unwrap());

        assert_eq!(output["source"], "fallback");
        assert_eq!(output["status"], 503);
    }

    #[tokio::test]
    async fn test_passthrough_network_failure_is_error() {
        let (manager, _) = manager(StubNetwork::default(), &[]).await;

        let err = fetch_impl(&manager, params("http://localhost:7000/api", Some("POST"))).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode(-32008));
    }
}
