//! Unified error types for pwa-cache.
//!
//! Every variant renders with a stable upper-case code prefix so log lines
//! and proxy error bodies can be grepped by failure class.

use tokio_rusqlite::rusqlite;

/// Unified error types for the caching worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown control action).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL or path that cannot be resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Transport-level failure reaching the network.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A precache manifest entry could not be fetched.
    #[error("INSTALL_FAILED: {path}: {reason}")]
    InstallFailed { path: String, reason: String },

    /// Lifecycle transition not allowed from the current state.
    #[error("INVALID_STATE: cannot {action} while {state}")]
    InvalidState { action: String, state: String },

    /// Capability recognised but deliberately not implemented.
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl Error {
    /// Whether the error originated in the cache store rather than the network or caller.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_))
    }
}
