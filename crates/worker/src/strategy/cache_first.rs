//! Cache-first strategy for static and media assets.
//!
//! Precache hit → served with no network call. Miss → network; a 200 within
//! the size limit is written back into the precache generation. Network failure → offline page,
//! then a plain-text 503.

use pwacache_client::FetchRequest;
use pwacache_core::Error;

use super::{ResponseSource, Served, StrategyContext, service_unavailable};

const UNAVAILABLE_BODY: &str = "Offline - resource unavailable";

pub async fn cache_first(ctx: &StrategyContext<'_>, request: &FetchRequest) -> Result<Served, Error> {
    let key = request.key();
    let precache = ctx.store.open(&ctx.generations.precache).await?;

    if let Some(hit) = ctx.store.match_request(&precache, &key).await? {
        tracing::debug!(url = %key.url, "cache hit");
        return Ok(Served::new(hit, ResponseSource::Precache));
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            let (caller, snapshot) = response.tee();
            ctx.store_quietly(&ctx.generations.precache, &key, &snapshot).await;
            Ok(Served::new(caller, ResponseSource::Network))
        }
        Err(e) => {
            tracing::warn!(url = %key.url, error = %e, "fetch failed, falling back to offline page");

            if let Some(page) = ctx.offline_page(&precache).await? {
                return Ok(page);
            }

            Ok(service_unavailable(&key.url, "text/plain", UNAVAILABLE_BODY))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, StubNetwork};
    use pwacache_core::CacheStore;

    async fn run(
        store: &dyn CacheStore, network: &StubNetwork, request: &FetchRequest,
    ) -> Served {
        let config = testing::worker_config("49");
        let offline_key = config.offline_key().unwrap();
        let ctx = StrategyContext {
            store,
            network,
            generations: &config.generations,
            offline_key: &offline_key,
            max_entry_bytes: 16,
        };
        cache_first(&ctx, request).await.unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit_without_network() {
        let store = testing::memory_store().await;
        let network = StubNetwork::new();
        network.serve("/static/css/style.css", 200, "body{}");
        let request = testing::get("/static/css/style.css");

        let first = run(store.as_ref(), &network, &request).await;
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(&first.response.body[..], b"body{}");
        assert_eq!(network.calls(), 1);

        let cached = testing::lookup(store.as_ref(), "extinct-mammals-v49", "/static/css/style.css").await;
        assert!(cached.is_some());

        let second = run(store.as_ref(), &network, &request).await;
        assert_eq!(second.source, ResponseSource::Precache);
        assert_eq!(second.response.body, first.response.body);
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_precache_hit_skips_network() {
        let store = testing::memory_store().await;
        testing::seed(store.as_ref(), "extinct-mammals-v49", "/static/js/script.js", "precached").await;
        let network = StubNetwork::new();

        let served = run(store.as_ref(), &network, &testing::get("/static/js/script.js")).await;
        assert_eq!(served.source, ResponseSource::Precache);
        assert_eq!(&served.response.body[..], b"precached");
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_200_not_cached() {
        let store = testing::memory_store().await;
        let network = StubNetwork::new();
        network.serve("/media/missing.jpg", 404, "nope");
        network.serve("/static/moved.css", 301, "");
        network.serve("/static/empty.css", 204, "");

        for path in ["/media/missing.jpg", "/static/moved.css", "/static/empty.css"] {
            let served = run(store.as_ref(), &network, &testing::get(path)).await;
            assert_eq!(served.source, ResponseSource::Network);
            assert!(testing::lookup(store.as_ref(), "extinct-mammals-v49", path).await.is_none(), "{path}");
        }

        let served = run(store.as_ref(), &network, &testing::get("/media/missing.jpg")).await;
        assert_eq!(served.response.status, 404);
        assert_eq!(network.calls(), 4);
    }

    #[tokio::test]
    async fn test_oversized_response_served_but_not_cached() {
        let store = testing::memory_store().await;
        let network = StubNetwork::new();
        let big = "x".repeat(64);
        network.serve("/media/mammoth.jpg", 200, &big);

        let served = run(store.as_ref(), &network, &testing::get("/media/mammoth.jpg")).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.status, 200);
        assert_eq!(served.response.body.len(), 64);
        assert!(testing::lookup(store.as_ref(), "extinct-mammals-v49", "/media/mammoth.jpg").await.is_none());

        run(store.as_ref(), &network, &testing::get("/media/mammoth.jpg")).await;
        assert_eq!(network.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_still_serves_network_response() {
        let store = testing::read_only_store().await;
        let network = StubNetwork::new();
        network.serve("/static/css/extra.css", 200, "body{}");

        let served = run(store.as_ref(), &network, &testing::get("/static/css/extra.css")).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(&served.response.body[..], b"body{}");
    }

    #[tokio::test]
    async fn test_network_failure_serves_offline_page() {
        let store = testing::memory_store().await;
        testing::seed(store.as_ref(), "extinct-mammals-v49", "/offline/", "you are offline").await;
        let network = StubNetwork::new();
        network.set_offline(true);

        let served = run(store.as_ref(), &network, &testing::get("/media/dodo.png")).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(&served.response.body[..], b"you are offline");
    }

    #[tokio::test]
    async fn test_network_failure_without_offline_page_is_503() {
        let store = testing::memory_store().await;
        let network = StubNetwork::new();
        network.set_offline(true);

        let served = run(store.as_ref(), &network, &testing::get("/static/css/style.css")).await;
        assert_eq!(served.source, ResponseSource::Synthetic);
        assert_eq!(served.response.status, 503);
        assert_eq!(served.response.content_type(), Some("text/plain"));
        assert_eq!(&served.response.body[..], UNAVAILABLE_BODY.as_bytes());
    }
}
