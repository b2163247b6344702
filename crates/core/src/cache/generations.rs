//! Generation-level operations: open, enumerate, delete.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::entries::GenerationHandle;
use crate::Error;

/// Summary of one stored generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationStats {
    pub name: String,
    pub entries: u64,
    pub body_bytes: u64,
    pub created_at: String,
}

impl CacheDb {
    /// Open a generation by name, creating it if it does not exist yet.
    pub async fn open_generation(&self, name: &str) -> Result<GenerationHandle, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(GenerationHandle::new(self.clone(), name.to_string()))
    }

    /// Handle to a generation without touching the database.
    ///
    /// Lookups against a generation that does not exist yet are misses; the
    /// first `put` creates it.
    pub fn generation(&self, name: &str) -> GenerationHandle {
        GenerationHandle::new(self.clone(), name.to_string())
    }

    /// All generation names, oldest first.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry in it.
    ///
    /// Returns false if no generation with that name existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Per-generation entry counts and body sizes, oldest first.
    pub async fn generation_stats(&self) -> Result<Vec<GenerationStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.created_at, COUNT(e.key), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM generations g
                     LEFT JOIN entries e ON e.generation = g.name
                     GROUP BY g.name, g.created_at
                     ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(GenerationStats {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                            body_bytes: row.get::<_, i64>(3)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
