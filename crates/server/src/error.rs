//! Structured errors for the proxy.
//!
//! Every error becomes a JSON body `{"error": "<CODE>: <message>"}` with a
//! status chosen by failure class.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pwacache_client::FetchError;
use pwacache_core::Error;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Worker(#[from] Error),

    /// A pass-through request could not reach the content server.
    #[error("BAD_GATEWAY: {0}")]
    Upstream(#[from] FetchError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Worker(err) if err.is_storage() => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Worker(Error::InvalidInput(_) | Error::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Worker(Error::InvalidState { .. }) => StatusCode::CONFLICT,
            ProxyError::Worker(Error::Unsupported(_)) => StatusCode::NOT_IMPLEMENTED,
            ProxyError::Worker(Error::InstallFailed { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Worker(Error::Network(_)) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
