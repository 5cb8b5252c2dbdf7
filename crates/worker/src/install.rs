//! Precache installer.
//!
//! Every manifest entry is fetched with `CacheMode::Reload`. Nothing is written
//! until all of them have answered 2xx, then the whole set lands in one store
//! transaction, so a failed install never leaves a partial generation behind.

use futures_util::future::try_join_all;
use pwacache_client::{CacheMode, FetchRequest, Network};
use pwacache_core::{CacheStore, Error, RequestKey, StoredResponse};

use crate::config::WorkerConfig;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub cached: usize,
}

async fn fetch_entry(network: &dyn Network, path: &str, request: FetchRequest) -> Result<(RequestKey, StoredResponse), Error> {
    let key = request.key();
    let response = network.fetch(&request).await.map_err(|e| Error::InstallFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status.is_success() {
        return Err(Error::InstallFailed { path: path.to_string(), reason: format!("status {}", response.status.as_u16()) });
    }

    Ok((key, response.into_stored()))
}

/// Fetch the manifest and write it into the version's precache generation.
pub async fn precache(store: &dyn CacheStore, network: &dyn Network, config: &WorkerConfig) -> Result<InstallReport, Error> {
    let generation = &config.generations.precache;
    let resolved = config.manifest.resolve(&config.origin)?;

    tracing::info!(generation = %generation, entries = resolved.len(), "precaching manifest");

    let fetches = resolved.into_iter().map(|(path, url)| async move {
        let request = FetchRequest::get(url).with_cache_mode(CacheMode::Reload);
        fetch_entry(network, &path, request).await
    });

    let entries = match try_join_all(fetches).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(generation = %generation, error = %e, "install aborted");
            return Err(e);
        }
    };

    let cached = entries.len();
    store.put_all(generation, entries).await?;

    tracing::info!(generation = %generation, cached, "precache complete");
    Ok(InstallReport { generation: generation.clone(), cached })
}
