//! cache_generations tool implementation.
//!
//! Lists every stored generation with its entry count and body size.

use mapcache_core::{CacheDb, GenerationStats};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use crate::tools::json_result;

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// Generation the worker reads and writes.
    pub current: String,
    pub generations: Vec<GenerationStats>,
}

pub async fn generations_impl(db: &CacheDb, current: &str) -> Result<CallToolResult, McpError> {
    let generations = db.generation_stats().await?;
    json_result(&CacheGenerationsOutput { current: current.to_string(), generations })
}
