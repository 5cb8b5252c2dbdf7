//! Network-first strategy for pages and API responses.
//!
//! Fallback chain, each level tried only when the previous one has nothing:
//! live network → runtime generation → precache generation → offline page →
//! synthetic 503.

use pwacache_client::FetchRequest;
use pwacache_core::Error;

use super::{ResponseSource, Served, StrategyContext, service_unavailable};

const OFFLINE_BODY: &str = "Offline - you have no internet connection";

pub async fn network_first(ctx: &StrategyContext<'_>, request: &FetchRequest) -> Result<Served, Error> {
    let key = request.key();

    let error = match ctx.network.fetch(request).await {
        Ok(response) => {
            let (caller, snapshot) = response.tee();
            ctx.store_quietly(&ctx.generations.runtime, &key, &snapshot).await;
            return Ok(Served::new(caller, ResponseSource::Network));
        }
        Err(e) => e,
    };

    tracing::warn!(url = %key.url, error = %error, "network request failed");

    if ctx.store.has(&ctx.generations.runtime).await? {
        let runtime = ctx.store.open(&ctx.generations.runtime).await?;
        if let Some(hit) = ctx.store.match_request(&runtime, &key).await? {
            tracing::debug!(url = %key.url, "serving from runtime cache");
            return Ok(Served::new(hit, ResponseSource::Runtime));
        }
    }

    let precache = ctx.store.open(&ctx.generations.precache).await?;
    if let Some(hit) = ctx.store.match_request(&precache, &key).await? {
        tracing::debug!(url = %key.url, "serving from precache");
        return Ok(Served::new(hit, ResponseSource::Precache));
    }

    if let Some(page) = ctx.offline_page(&precache).await? {
        tracing::debug!(url = %key.url, "serving offline page");
        return Ok(page);
    }

    Ok(service_unavailable(&key.url, "text/html; charset=utf-8", OFFLINE_BODY))
}
