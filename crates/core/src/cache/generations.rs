//! Generation lifecycle operations.
//!
//! A generation is a named partition of the store. It is created when first
//! opened, never partially expired, and dropped as a unit; deleting a
//! generation cascades to every entry it holds.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

/// Handle to an opened generation.
///
/// Holding a handle does not keep the generation alive; a concurrent delete
/// makes later writes through the handle fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHandle {
    name: String,
}

impl CacheHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Open a generation by name, creating it if it does not exist.
    pub async fn open_generation(&self, name: &str) -> Result<CacheHandle, Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let handle_name = name.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                if inserted > 0 {
                    tracing::debug!(generation = %name, "created cache generation");
                }
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheHandle { name: handle_name })
    }

    /// Whether a generation with this name currently exists.
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

    /// List every generation name currently in the store.
    pub async fn generation_names(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no generation with that name existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
