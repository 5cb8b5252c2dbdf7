//! Offline caching worker for the extinct-mammals site.
//!
//! This crate provides:
//! - Request routing into cache-first and network-first strategies
//! - Precache install and stale-generation reaping per version
//! - An explicit lifecycle state machine and the registration that swaps versions
//! - Control messages, push notifications and the (unsupported) sync hook

pub mod config;
pub mod install;
pub mod lifecycle;
pub mod messages;
pub mod push;
pub mod reaper;
pub mod registration;
pub mod router;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::{GenerationNames, PrecacheManifest, WorkerConfig};
pub use install::InstallReport;
pub use lifecycle::{LifecycleEvent, LifecycleState};
pub use messages::{ControlMessage, MessageOutcome};
pub use push::{FAVORITES_SYNC_TAG, Notification};
pub use registration::{GenerationStatus, Registration, RegistrationStatus};
pub use router::{PassReason, Route, RouteClass, RoutePolicy, StrategyKind};
pub use strategy::{FetchOutcome, ResponseSource, Served};
pub use worker::{ServiceWorker, WorkerStatus};
