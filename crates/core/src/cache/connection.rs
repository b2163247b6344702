//! Opening the cache store.
//!
//! Every handle runs with WAL journaling and foreign keys enforced, and is
//! migrated to the latest schema before it is returned.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// Cache store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning shares the same connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open the store at `path`, creating the file if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open a private in-memory store. Used by tests.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Flush and close the store. Every clone of this handle fails with
    /// `CACHE_ERROR` afterwards.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::from)
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        let schema_version = migrations::run(&conn).await?;
        tracing::debug!(schema_version, "cache store ready");

        Ok(Self { conn })
    }
}
