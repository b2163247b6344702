//! MCP tool implementations.
//!
//! Each tool delivers one lifecycle signal to the cache manager or inspects
//! the store. Implementations are generic over the network so they can be
//! exercised without sockets.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use cache::generations_impl;
pub use fetch::{WorkerFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, state_impl};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize output: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
