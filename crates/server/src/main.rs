//! mapcache-host entry point.
//!
//! Boots the offline cache worker and serves its lifecycle signals as MCP
//! tools on stdio. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use mapcache_client::{FetchConfig, HttpNetwork};
use mapcache_core::{AppConfig, CacheDb};
use mapcache_worker::{CacheManager, WorkerOptions};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        generation = %config.generation,
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "Starting mapcache-host on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&config), config.origin_url()?)?;
    let options = WorkerOptions::from_config(&config)?;
    let manager = CacheManager::new(options, db, Arc::new(network));

    let handler = handler::MapCacheHost::new(manager.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    manager.db().clone().close().await?;
    tracing::info!("cache store closed");

    Ok(())
}
