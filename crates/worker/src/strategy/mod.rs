//! Fetch strategies and the responses they produce.

pub mod cache_first;
pub mod network_first;

use bytes::Bytes;
use pwacache_client::Network;
use pwacache_core::{CacheHandle, CacheStore, Error, RequestKey, StoredResponse};

use crate::config::GenerationNames;
use crate::router::PassReason;

pub use cache_first::cache_first;
pub use network_first::network_first;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Runtime,
    Precache,
    Offline,
    Synthetic,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Runtime => "runtime",
            ResponseSource::Precache => "precache",
            ResponseSource::Offline => "offline",
            ResponseSource::Synthetic => "synthetic",
        }
    }
}

/// A response chosen by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: StoredResponse,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: StoredResponse, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

/// What the worker decided for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Leave the request to the network; nothing is read from or written to the store.
    Passthrough(PassReason),
    Respond(Served),
}

/// Borrowed collaborators a strategy runs against.
pub struct StrategyContext<'a> {
    pub store: &'a dyn CacheStore,
    pub network: &'a dyn Network,
    pub generations: &'a GenerationNames,
    pub offline_key: &'a RequestKey,
    pub max_entry_bytes: usize,
}

impl StrategyContext<'_> {
    /// Write a network snapshot into `generation` if it qualifies.
    ///
    /// Only 200 responses no larger than `max_entry_bytes` are kept. Any store
    /// failure, including opening the generation, is logged and swallowed: the
    /// caller already holds a good response.
    async fn store_quietly(&self, generation: &str, key: &RequestKey, response: &StoredResponse) {
        if !response.is_cacheable() {
            return;
        }
        if response.body.len() > self.max_entry_bytes {
            tracing::debug!(
                generation,
                url = %key.url,
                size = response.body.len(),
                limit = self.max_entry_bytes,
                "response too large to cache"
            );
            return;
        }

        match self.put_into(generation, key, response).await {
            Ok(()) => tracing::debug!(generation, url = %key.url, "cached response"),
            Err(e) => tracing::warn!(generation, url = %key.url, error = %e, "cache write failed"),
        }
    }

    async fn put_into(&self, generation: &str, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        let handle = self.store.open(generation).await?;
        self.store.put(&handle, key, response).await
    }

    /// The precached offline page, if present.
    async fn offline_page(&self, precache: &CacheHandle) -> Result<Option<Served>, Error> {
        let page = self.store.match_request(precache, self.offline_key).await?;
        Ok(page.map(|response| Served::new(response, ResponseSource::Offline)))
    }
}

/// Build a 503 response for when every source has failed.
pub(crate) fn service_unavailable(url: &str, content_type: &str, body: &'static str) -> Served {
    let response = StoredResponse {
        url: url.to_string(),
        status: 503,
        status_text: "Service Unavailable".to_string(),
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body: Bytes::from_static(body.as_bytes()),
        // never stored, so no timestamp
        stored_at: String::new(),
    };
    Served::new(response, ResponseSource::Synthetic)
}
