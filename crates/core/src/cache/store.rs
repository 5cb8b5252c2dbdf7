//! The cache store contract used by the worker.
//!
//! Strategies and lifecycle handlers depend on this trait rather than on the
//! SQLite type so alternative stores can be swapped in.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use super::entries::StoredResponse;
use super::generations::CacheHandle;
use super::hash::RequestKey;
use crate::Error;

/// Generation-partitioned request→response store.
///
/// A miss is `Ok(None)`, never an error.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Open (creating if needed) the generation called `name`.
    async fn open(&self, name: &str) -> Result<CacheHandle, Error>;

    /// Whether a generation exists, without creating it.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Look up `key` within an opened generation.
    async fn match_request(&self, handle: &CacheHandle, key: &RequestKey) -> Result<Option<StoredResponse>, Error>;

    /// Store a snapshot under `key`, replacing any earlier entry.
    async fn put(&self, handle: &CacheHandle, key: &RequestKey, response: &StoredResponse) -> Result<(), Error>;

    /// Write a whole generation atomically.
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error>;

    /// Drop a generation; `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Names of every generation in the store.
    async fn keys(&self) -> Result<BTreeSet<String>, Error>;

    /// Number of entries in a generation; zero if it does not exist.
    async fn entry_count(&self, name: &str) -> Result<u64, Error>;
}

#[async_trait::async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, name: &str) -> Result<CacheHandle, Error> {
        self.open_generation(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.has_generation(name).await
    }

    async fn match_request(&self, handle: &CacheHandle, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.match_entry(handle, key).await
    }

    async fn put(&self, handle: &CacheHandle, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        self.put_entry(handle, key, response).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        self.put_generation(name, entries).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_generation(name).await
    }

    async fn keys(&self) -> Result<BTreeSet<String>, Error> {
        self.generation_names().await
    }

    async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        CacheDb::entry_count(self, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entries::tests::make_response;

    async fn roundtrip(store: &dyn CacheStore) {
        let handle = store.open("shell-v49").await.unwrap();
        let url = "https://example.com/static/js/script.js";
        store.put(&handle, &RequestKey::get(url), &make_response(url, "console.log(1)")).await.unwrap();

        let hit = store.match_request(&handle, &RequestKey::get(url)).await.unwrap();
        assert!(hit.is_some());
        assert!(store.keys().await.unwrap().contains("shell-v49"));
        assert_eq!(store.entry_count("shell-v49").await.unwrap(), 1);
        assert_eq!(store.entry_count("shell-v12").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_db_as_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        roundtrip(&db).await;
        assert!(db.has("shell-v49").await.unwrap());
        assert!(db.delete("shell-v49").await.unwrap());
        assert!(!db.has("shell-v49").await.unwrap());
        assert!(db.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!("pwacache-store-{}.sqlite", std::process::id()));
        let url = "https://example.com/offline/";
        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put_all("shell-v49", vec![(RequestKey::get(url), make_response(url, "offline"))])
                .await
                .unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        let handle = db.open("shell-v49").await.unwrap();
        let hit = db.match_request(&handle, &RequestKey::get(url)).await.unwrap().unwrap();
        assert_eq!(hit.body, bytes::Bytes::from("offline"));

        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
