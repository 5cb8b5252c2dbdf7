//! SQLite-backed cache store partitioned into named generations.
//!
//! This module provides a persistent request→response store using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named generations that are created, listed and dropped as a unit
//! - Request keys derived from method and canonical URL via SHA-256
//! - All-or-nothing batch writes for precaching
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use generations::CacheHandle;
pub use hash::RequestKey;
pub use store::CacheStore;
