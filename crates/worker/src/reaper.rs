//! Generation reaper, run at activation.

use pwacache_core::{CacheStore, Error};

use crate::config::GenerationNames;

/// Delete every generation that is not one of `current`.
///
/// Returns the deleted names in sorted order. Running it again on a clean
/// store deletes nothing.
pub async fn reap(store: &dyn CacheStore, current: &GenerationNames) -> Result<Vec<String>, Error> {
    let mut deleted = Vec::new();

    for name in store.keys().await? {
        if current.contains(&name) {
            continue;
        }
        if store.delete(&name).await? {
            tracing::info!(generation = %name, "deleted stale generation");
            deleted.push(name);
        }
    }

    Ok(deleted)
}

/// Delete every generation regardless of version.
pub async fn purge_all(store: &dyn CacheStore) -> Result<Vec<String>, Error> {
    let mut deleted = Vec::new();
    for name in store.keys().await? {
        if store.delete(&name).await? {
            deleted.push(name);
        }
    }
    tracing::info!(count = deleted.len(), "purged all generations");
    Ok(deleted)
}
