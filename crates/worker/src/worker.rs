//! One worker version: its configuration, lifecycle state and event handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pwacache_client::{FetchRequest, Network};
use pwacache_core::{CacheStore, Error, RequestKey};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::config::WorkerConfig;
use crate::install::{self, InstallReport};
use crate::lifecycle::{LifecycleEvent, LifecycleState};
use crate::push::{self, Notification};
use crate::reaper;
use crate::router::{PassReason, Route, StrategyKind};
use crate::strategy::{self, FetchOutcome, StrategyContext};

/// Snapshot of a worker for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub version: String,
    pub state: LifecycleState,
    pub precache: String,
    pub runtime: String,
    pub claimed: bool,
}

/// A single worker version bound to a store and a network.
pub struct ServiceWorker {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    config: Arc<WorkerConfig>,
    offline_key: RequestKey,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
}

impl ServiceWorker {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>, config: WorkerConfig) -> Result<Self, Error> {
        let offline_key = config.offline_key()?;
        Ok(Self {
            store,
            network,
            config: Arc::new(config),
            offline_key,
            state: RwLock::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Whether this worker asked to take control without waiting.
    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Whether activation has claimed already-open clients.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    async fn transition(&self, event: LifecycleEvent) -> Result<LifecycleState, Error> {
        let mut state = self.state.write().await;
        let from = *state;
        let next = from.next(event)?;
        tracing::debug!(version = %self.config.version, %from, to = %next, "lifecycle transition");
        *state = next;
        Ok(next)
    }

    /// Install handler: precache the manifest.
    ///
    /// On failure the worker becomes redundant and the store is untouched.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(LifecycleEvent::Install).await?;

        match install::precache(self.store.as_ref(), self.network.as_ref(), &self.config).await {
            Ok(report) => {
                self.transition(LifecycleEvent::Installed).await?;
                if self.config.skip_waiting_on_install {
                    self.skip_waiting();
                }
                Ok(report)
            }
            Err(e) => {
                self.transition(LifecycleEvent::InstallFailed).await?;
                Err(e)
            }
        }
    }

    /// Activate handler: reap stale generations, then claim clients.
    ///
    /// A reaping failure is logged and does not block activation.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.transition(LifecycleEvent::Activate).await?;

        let deleted = match reaper::reap(self.store.as_ref(), &self.config.generations).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "reaping stale generations failed");
                Vec::new()
            }
        };

        self.claimed.store(true, Ordering::SeqCst);
        self.transition(LifecycleEvent::Activated).await?;
        tracing::info!(version = %self.config.version, reaped = deleted.len(), "worker activated");
        Ok(deleted)
    }

    /// Mark the worker redundant after a newer version took over.
    pub async fn retire(&self) {
        if let Err(e) = self.transition(LifecycleEvent::Replaced).await {
            tracing::debug!(version = %self.config.version, error = %e, "worker already retired");
        }
    }

    /// Fetch handler.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, Error> {
        if !self.state().await.can_intercept_fetch() {
            return Ok(FetchOutcome::Passthrough(PassReason::NotControlled));
        }

        let class = match self.config.routes.classify(&request.method, &request.url) {
            Route::Passthrough(reason) => return Ok(FetchOutcome::Passthrough(reason)),
            Route::Intercept(class) => class,
        };

        let ctx = StrategyContext {
            store: self.store.as_ref(),
            network: self.network.as_ref(),
            generations: &self.config.generations,
            offline_key: &self.offline_key,
            max_entry_bytes: self.config.max_entry_bytes,
        };

        let served = match class.strategy() {
            StrategyKind::CacheFirst => strategy::cache_first(&ctx, request).await?,
            StrategyKind::NetworkFirst => strategy::network_first(&ctx, request).await?,
        };

        tracing::debug!(url = %request.url, ?class, source = served.source.as_str(), status = served.response.status, "served");
        Ok(FetchOutcome::Respond(served))
    }

    /// Delete every generation in the store.
    pub async fn purge_all(&self) -> Result<Vec<String>, Error> {
        reaper::purge_all(self.store.as_ref()).await
    }

    /// Push handler.
    pub fn push(&self, payload: Option<&str>) -> Notification {
        push::notification_for(&self.config.notification, payload)
    }

    /// Notification click handler: the page to open.
    pub fn notification_click(&self) -> Result<Url, Error> {
        push::click_target(&self.config.notification, &self.config.origin)
    }

    /// Background sync handler.
    pub fn sync(&self, tag: &str) -> Result<(), Error> {
        push::handle_sync(tag)
    }

    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            version: self.config.version.clone(),
            state: self.state().await,
            precache: self.config.generations.precache.clone(),
            runtime: self.config.generations.runtime.clone(),
            claimed: self.is_claimed(),
        }
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.config.version)
            .field("generations", &self.config.generations)
            .finish()
    }
}
