//! MCP server handler implementation.
//!
//! Each tool delivers a lifecycle signal to the cache manager, which is the
//! only component that touches the store.

use mapcache_client::HttpNetwork;
use mapcache_worker::CacheManager;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::tools::{WorkerFetchParams, activate_impl, fetch_impl, generations_impl, install_impl, state_impl};

#[derive(Clone)]
pub struct MapCacheHost {
    manager: CacheManager<HttpNetwork>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MapCacheHost {
    pub fn new(manager: CacheManager<HttpNetwork>) -> Self {
        Self { manager, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Deliver the install signal: pre-fetch the preload list into the current cache generation. Returns cached and failed URLs."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager).await
    }

    #[tool(description = "Deliver the activate signal: delete every cache generation except the current one and start intercepting fetches.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager).await
    }

    /// Route a request through the worker.
    ///
    /// GET requests are served cache-first once the worker is active; anything
    /// else is fetched by the host directly.
    #[tool(
        description = "Fetch a URL through the offline cache worker. Returns status, headers, body and whether it came from cache, network, fallback or passthrough."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, params.0).await
    }

    #[tool(description = "Report the worker lifecycle state, current cache generation and preload list.")]
    async fn worker_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.manager).await
    }

    #[tool(description = "List stored cache generations with entry counts and body sizes.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(self.manager.db(), &self.manager.options().generation).await
    }
}

impl ServerHandler for MapCacheHost {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mapcache-host".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
