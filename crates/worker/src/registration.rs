//! Registration: which worker version controls requests and which is waiting.
//!
//! Promotion holds the `active` write lock while the new worker activates, so
//! requests arriving mid-promotion queue behind it instead of seeing a
//! half-reaped store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pwacache_client::{FetchRequest, Network};
use pwacache_core::{CacheStore, Error};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::config::WorkerConfig;
use crate::messages::{ControlMessage, MessageOutcome};
use crate::push::Notification;
use crate::reaper;
use crate::router::PassReason;
use crate::strategy::FetchOutcome;
use crate::worker::{ServiceWorker, WorkerStatus};

/// A generation in the store and how many entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStatus {
    pub name: String,
    pub entries: u64,
}

/// Snapshot of the registration for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub active: Option<WorkerStatus>,
    pub waiting: Option<WorkerStatus>,
    pub generations: Vec<GenerationStatus>,
}

pub struct Registration {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: Mutex<Option<Arc<ServiceWorker>>>,
    skip_waiting_requested: AtomicBool,
}

impl Registration {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Self {
        Self {
            store,
            network,
            active: RwLock::new(None),
            waiting: Mutex::new(None),
            skip_waiting_requested: AtomicBool::new(false),
        }
    }

    /// Install a worker for `config` and decide whether it takes control.
    ///
    /// An install failure leaves the current active worker in charge.
    pub async fn register(&self, config: WorkerConfig) -> Result<Arc<ServiceWorker>, Error> {
        let worker = Arc::new(ServiceWorker::new(self.store.clone(), self.network.clone(), config)?);
        tracing::info!(version = worker.version(), "registering worker");

        if let Err(e) = worker.install().await {
            tracing::error!(version = worker.version(), error = %e, "install failed, keeping current worker");
            return Err(e);
        }

        let has_active = self.active.read().await.is_some();
        let skip = worker.wants_skip_waiting() || self.skip_waiting_requested.swap(false, Ordering::SeqCst);

        if skip || !has_active {
            self.promote(worker.clone()).await?;
        } else {
            tracing::info!(version = worker.version(), "worker installed and waiting");
            if let Some(previous) = self.waiting.lock().await.replace(worker.clone()) {
                previous.retire().await;
            }
        }

        Ok(worker)
    }

    /// Activate `worker` and make it the controller.
    ///
    /// Whatever sits in the waiting slot is older than `worker` and is retired
    /// with the previous controller, so it can never be promoted over it later.
    async fn promote(&self, worker: Arc<ServiceWorker>) -> Result<(), Error> {
        let mut active = self.active.write().await;
        worker.activate().await?;

        let stale = self.waiting.lock().await.take();
        if let Some(stale) = stale.filter(|w| !Arc::ptr_eq(w, &worker)) {
            tracing::info!(version = stale.version(), "discarding superseded waiting worker");
            stale.retire().await;
        }

        if let Some(previous) = active.replace(worker) {
            previous.retire().await;
        }
        Ok(())
    }

    /// Promote the waiting worker, if there is one.
    pub async fn activate_waiting(&self) -> Result<Option<Arc<ServiceWorker>>, Error> {
        let Some(worker) = self.waiting.lock().await.take() else {
            return Ok(None);
        };
        self.promote(worker.clone()).await?;
        Ok(Some(worker))
    }

    /// The worker currently controlling requests.
    pub async fn controller(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.lock().await.clone()
    }

    /// Route a request through the active worker.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, Error> {
        let active = self.active.read().await;
        match active.as_ref() {
            Some(worker) => worker.handle_fetch(request).await,
            None => Ok(FetchOutcome::Passthrough(PassReason::NotControlled)),
        }
    }

    /// Handle a control message from a page.
    pub async fn post_message(&self, message: ControlMessage) -> Result<MessageOutcome, Error> {
        tracing::info!(?message, "control message");
        match message {
            ControlMessage::SkipWaiting => match self.activate_waiting().await? {
                Some(worker) => Ok(MessageOutcome::Promoted { version: worker.version().to_string() }),
                None => {
                    self.skip_waiting_requested.store(true, Ordering::SeqCst);
                    Ok(MessageOutcome::SkipWaitingRecorded)
                }
            },
            ControlMessage::ClearCache => {
                let generations = reaper::purge_all(self.store.as_ref()).await?;
                Ok(MessageOutcome::Cleared { generations })
            }
        }
    }

    async fn require_active(&self, action: &str) -> Result<Arc<ServiceWorker>, Error> {
        self.controller().await.ok_or_else(|| Error::InvalidState {
            action: action.to_string(),
            state: "no worker is active".to_string(),
        })
    }

    pub async fn push(&self, payload: Option<&str>) -> Result<Notification, Error> {
        Ok(self.require_active("handle push").await?.push(payload))
    }

    pub async fn notification_click(&self) -> Result<Url, Error> {
        self.require_active("handle notification click").await?.notification_click()
    }

    pub async fn sync(&self, tag: &str) -> Result<(), Error> {
        self.require_active("handle sync").await?.sync(tag)
    }

    pub async fn status(&self) -> Result<RegistrationStatus, Error> {
        let active = match self.controller().await {
            Some(worker) => Some(worker.status().await),
            None => None,
        };
        let waiting = match self.waiting().await {
            Some(worker) => Some(worker.status().await),
            None => None,
        };
        let mut generations = Vec::new();
        for name in self.store.keys().await? {
            let entries = self.store.entry_count(&name).await?;
            generations.push(GenerationStatus { name, entries });
        }
        Ok(RegistrationStatus { active, waiting, generations })
    }
}
