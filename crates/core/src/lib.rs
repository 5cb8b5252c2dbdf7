//! Core types and shared functionality for pwa-cache.
//!
//! This crate provides:
//! - Generation-partitioned cache store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheHandle, CacheStore, RequestKey, StoredResponse};
pub use config::{AppConfig, ConfigError, NotificationConfig};
pub use error::Error;
