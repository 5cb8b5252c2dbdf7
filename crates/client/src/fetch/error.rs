//! Transport-level fetch errors.
//!
//! Only failures to obtain a response live here. An HTTP error status is a
//! successful fetch as far as this layer is concerned.

use std::sync::Arc;

use super::url::UrlError;

/// Errors from the network fetch pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// Request timed out in the underlying network stack.
    #[error("request timeout")]
    Timeout,

    /// Connection refused, DNS failure, reset, and similar.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Client could not be constructed.
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Network(Arc::new(err)) }
    }
}

impl From<FetchError> for pwacache_core::Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(e) => pwacache_core::Error::InvalidUrl(e.to_string()),
            other => pwacache_core::Error::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(FetchError::Setup("no tls".into()).to_string(), "client setup failed: no tls");
        assert_eq!(FetchError::Timeout.to_string(), "request timeout");
    }

    #[test]
    fn test_into_core_error() {
        let err: pwacache_core::Error = FetchError::Timeout.into();
        assert!(matches!(err, pwacache_core::Error::Network(_)));

        let err: pwacache_core::Error = FetchError::InvalidUrl(UrlError::Empty).into();
        assert!(matches!(err, pwacache_core::Error::InvalidUrl(_)));
    }
}
