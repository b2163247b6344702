//! worker_install, worker_activate and worker_state tools.

use mapcache_client::Network;
use mapcache_worker::{CacheManager, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use super::json_result;

/// Output from the worker_state tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerStateOutput {
    pub state: WorkerState,
    pub generation: String,
    pub preload_urls: Vec<String>,
}

pub async fn install_impl<N: Network + 'static>(manager: &CacheManager<N>) -> Result<CallToolResult, McpError> {
    let report = manager.on_install().await?;
    json_result(&report)
}

pub async fn activate_impl<N: Network + 'static>(manager: &CacheManager<N>) -> Result<CallToolResult, McpError> {
    let report = manager.on_activate().await?;
    json_result(&report)
}

pub async fn state_impl<N: Network + 'static>(manager: &CacheManager<N>) -> Result<CallToolResult, McpError> {
    let options = manager.options();
    let output = WorkerStateOutput {
        state: manager.state().await,
        generation: options.generation.clone(),
        preload_urls: options.preload.urls().iter().map(|u| u.to_string()).collect(),
    };
    json_result(&output)
}
