//! Schema migrations for the cache store.
//!
//! Applied versions are recorded in `schema_migrations`; each pending
//! migration runs in its own transaction together with its bookkeeping row,
//! so a failed migration leaves the store at the previous version.

use tokio_rusqlite::{Connection, params, rusqlite};

use super::Error;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "generations", sql: include_str!("../../migrations/001_generations.sql") },
    Migration { version: 2, name: "entries", sql: include_str!("../../migrations/002_entries.sql") },
];

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version)
}

/// Apply pending migrations and return the resulting schema version.
pub async fn run(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        let applied = applied_version(conn)?;
        let mut current = applied;

        for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql).map_err(|e| {
                Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name))
            })?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;

            tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
            current = migration.version;
        }

        Ok(current)
    })
    .await
    .map_err(Error::from)
}
