//! HTTP surface of the proxy.
//!
//! Every request not under `/__worker/` is intercepted: the active worker
//! either answers it from a strategy or hands it back for plain forwarding.
//! The `/__worker/` routes stand in for the page-side messaging, push and
//! sync events.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pwacache_client::{FetchRequest, Network};
use pwacache_core::{Error, StoredResponse};
use pwacache_worker::{ControlMessage, FetchOutcome, Registration};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::ProxyError;

/// Response header naming where the body came from.
pub const SOURCE_HEADER: &str = "x-pwa-cache";

/// Source label for requests the worker did not intercept.
const BYPASS: &str = "bypass";

#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<Registration>,
    pub network: Arc<dyn Network>,
    pub origin: Url,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/__worker/message", post(post_message))
        .route("/__worker/push", post(push))
        .route("/__worker/notificationclick", post(notification_click))
        .route("/__worker/sync", post(sync))
        .route("/__worker/status", get(status))
        .fallback(intercept)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rebuild an HTTP response from a snapshot.
fn replay(response: StoredResponse, source: &'static str) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = status;

    let headers = out.headers_mut();
    for (name, value) in &response.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(header = %name, "dropping unrepresentable header"),
        }
    }
    headers.insert(SOURCE_HEADER, HeaderValue::from_static(source));
    out
}

async fn intercept(
    State(state): State<AppState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes,
) -> Result<Response, ProxyError> {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let url = pwacache_client::resolve(&state.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = FetchRequest::new(method, url).with_headers(headers);
    if !body.is_empty() {
        request = request.with_body(body);
    }

    match state.registration.fetch(&request).await? {
        FetchOutcome::Respond(served) => Ok(replay(served.response, served.source.as_str())),
        FetchOutcome::Passthrough(reason) => {
            tracing::debug!(url = %request.url, ?reason, "forwarding without interception");
            let response = state.network.fetch(&request).await?;
            Ok(replay(response.into_stored(), BYPASS))
        }
    }
}

async fn post_message(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ProxyError> {
    let message = ControlMessage::parse(&body)?;
    let outcome = state.registration.post_message(message).await?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

async fn push(State(state): State<AppState>, body: String) -> Result<impl IntoResponse, ProxyError> {
    let notification = state.registration.push(Some(&body)).await?;
    Ok(Json(notification))
}

async fn notification_click(State(state): State<AppState>) -> Result<Redirect, ProxyError> {
    let target = state.registration.notification_click().await?;
    Ok(Redirect::to(target.as_str()))
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    tag: String,
}

async fn sync(State(state): State<AppState>, Json(request): Json<SyncRequest>) -> Result<StatusCode, ProxyError> {
    state.registration.sync(&request.tag).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, ProxyError> {
    Ok(Json(state.registration.status().await?))
}
