//! Stored response snapshots.
//!
//! Provides functions for writing and matching request→response entries
//! inside a generation.

use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::generations::CacheHandle;
use super::hash::RequestKey;
use crate::Error;

/// An immutable response snapshot.
///
/// The body is fully buffered when the snapshot is taken, so it can be read
/// any number of times and stored independently of the copy handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl StoredResponse {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Status is exactly 200, the only status the caching strategies persist.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

impl CacheDb {
    /// Write an entry into an opened generation.
    ///
    /// Overwrites any previous entry for the same key (last writer wins).
    pub async fn put_entry(
        &self, handle: &CacheHandle, key: &RequestKey, response: &StoredResponse,
    ) -> Result<(), Error> {
        let generation = handle.name().to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_entry(conn, &generation, &key, &response)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Create a generation and write all entries as a single transaction.
    ///
    /// Either every entry lands or none does; a failure part-way rolls back
    /// the generation row as well when it was created by this call.
    pub async fn put_generation(&self, name: &str, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                for (key, response) in &entries {
                    insert_entry(&tx, &name, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Find the entry for `key` in the given generation.
    ///
    /// A miss, including a generation that no longer exists, is `None`.
    pub async fn match_entry(&self, handle: &CacheHandle, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let generation = handle.name().to_string();
        let key_hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, status_text, headers_json, body, stored_at
                    FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                });

                match result {
                    Ok((url, status, status_text, headers_json, body, stored_at)) => {
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                        Ok(Some(StoredResponse { url, status, status_text, headers, body: Bytes::from(body), stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by a generation.
    pub async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

fn insert_entry(
    conn: &rusqlite::Connection, generation: &str, key: &RequestKey, response: &StoredResponse,
) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT INTO entries (
            generation, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation,
            &key.hash,
            &key.method,
            &key.url,
            response.status,
            &response.status_text,
            headers_json,
            response.body.as_ref(),
            &response.stored_at,
        ],
    )?;
    Ok(())
}
