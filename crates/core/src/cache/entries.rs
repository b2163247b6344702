//! Entry operations within a single generation.
//!
//! Provides lookup, upsert, removal and enumeration of stored response
//! snapshots. A handle stays usable after its generation was deleted: a later
//! `put` re-creates the generation row.

use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use crate::Error;
use crate::http::{Method, RequestDescriptor, ResponseSnapshot};

/// Handle to one named generation.
#[derive(Clone, Debug)]
pub struct GenerationHandle {
    db: CacheDb,
    name: String,
}

/// Raw row as read from the `entries` table, decoded outside the SQLite thread closure.
struct EntryRow {
    response_url: String,
    status: i64,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn decode(self) -> Result<ResponseSnapshot, Error> {
        let url = Url::parse(&self.response_url).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = u16::try_from(self.status).map_err(|_| Error::CorruptEntry(format!("status {}", self.status)))?;
        Ok(ResponseSnapshot {
            url,
            status,
            status_text: self.status_text,
            headers: serde_json::from_str(&self.headers_json)?,
            body: Bytes::from(self.body),
            response_type: self.response_type.parse()?,
        })
    }
}

impl GenerationHandle {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored snapshot for a request.
    ///
    /// Returns None on a miss, including for requests whose method is never stored.
    pub async fn match_request(&self, request: &RequestDescriptor) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = self.name.clone();
        let key = compute_entry_key(request);
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT response_url, status, status_text, response_type, headers_json, body
                     FROM entries WHERE generation = ?1 AND key = ?2",
                    params![generation, key],
                    |row| {
                        Ok(EntryRow {
                            response_url: row.get(0)?,
                            status: row.get(1)?,
                            status_text: row.get(2)?,
                            response_type: row.get(3)?,
                            headers_json: row.get(4)?,
                            body: row.get(5)?,
                        })
                    },
                );

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    /// Store a snapshot under a request, replacing any previous entry.
    pub async fn put(&self, request: &RequestDescriptor, response: &ResponseSnapshot) -> Result<(), Error> {
        if !request.method.is_cacheable() {
            return Err(Error::InvalidInput(format!("{} requests cannot be stored", request.method)));
        }

        let generation = self.name.clone();
        let key = compute_entry_key(request);
        let method = request.method.as_str();
        let url = request.cache_url().to_string();
        let request_headers_json = serde_json::to_string(&request.headers)?;
        let response_url = response.url.to_string();
        let status = response.status as i64;
        let status_text = response.status_text.clone();
        let response_type = response.response_type.as_str();
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&generation, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        generation, key, method, url, request_headers_json,
                        response_url, status, status_text, response_type, headers_json,
                        body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ON CONFLICT(generation, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        request_headers_json = excluded.request_headers_json,
                        response_url = excluded.response_url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        response_type = excluded.response_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &generation,
                        &key,
                        method,
                        &url,
                        &request_headers_json,
                        &response_url,
                        status,
                        &status_text,
                        response_type,
                        &headers_json,
                        body.as_ref(),
                        &now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a request. Returns false if there was none.
    pub async fn delete(&self, request: &RequestDescriptor) -> Result<bool, Error> {
        let generation = self.name.clone();
        let key = compute_entry_key(request);
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM entries WHERE generation = ?1 AND key = ?2", params![generation, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Requests with a stored entry, ordered by URL.
    pub async fn keys(&self) -> Result<Vec<RequestDescriptor>, Error> {
        let generation = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, request_headers_json FROM entries WHERE generation = ?1 ORDER BY url ASC",
                )?;
                let rows = stmt
                    .query_map(params![generation], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url, headers_json)| {
                Ok(RequestDescriptor {
                    method: method.parse::<Method>()?,
                    url: Url::parse(&url).map_err(|e| Error::CorruptEntry(e.to_string()))?,
                    headers: serde_json::from_str(&headers_json)?,
                })
            })
            .collect()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> Result<u64, Error> {
        let generation = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
