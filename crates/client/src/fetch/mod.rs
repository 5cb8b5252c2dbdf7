//! HTTP fetch pipeline between the worker and the content server.
//!
//! ### Requests
//! - `FetchRequest` carries method, canonical URL, forwarded headers and an
//!   optional body, plus a cache mode. `CacheMode::Reload` forces
//!   revalidation with `Cache-Control: no-cache`.
//!
//! ### Responses
//! - Any HTTP status is a successful fetch; only transport failures are errors.
//! - Bodies are buffered whole so a response can be split into independent
//!   snapshots with [`FetchResponse::tee`]. How much of that the store keeps
//!   is the worker's decision.
//! - Hop-by-hop and encoding headers are dropped from snapshots because the
//!   body is already decoded.

pub mod error;
pub mod url;

use bytes::Bytes;
use pwacache_core::{AppConfig, StoredResponse, cache::RequestKey};
use reqwest::Url;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use error::FetchError;
pub use reqwest::{Method, StatusCode};
pub use reqwest::header::{self as headers, HeaderMap};
pub use self::url::{UrlError, canonicalize, resolve};

/// Headers that describe a single connection or the wire encoding and must
/// not be replayed from a stored snapshot or forwarded upstream.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "content-encoding",
    "accept-encoding",
    "host",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pwa-cache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow. Zero hands redirects back to
    /// the caller untouched (default: 0)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pwa-cache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 0,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// How the request interacts with intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass intermediate caches and revalidate with the origin.
    Reload,
}

/// An outbound request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: header::HeaderMap,
    pub body: Option<Bytes>,
    pub cache_mode: CacheMode,
}

impl FetchRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: header::HeaderMap::new(), body: None, cache_mode: CacheMode::Default }
    }

    /// A plain GET for `url`.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_headers(mut self, headers: header::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Store key for this request: method plus URL without fragment.
    pub fn key(&self) -> RequestKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        RequestKey::new(self.method.as_str(), url.as_str())
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    pub status: StatusCode,
    pub bytes: Bytes,
    pub headers: header::HeaderMap,
}

impl FetchResponse {
    /// Convert into a storable snapshot.
    pub fn into_stored(self) -> StoredResponse {
        let headers = self
            .headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        StoredResponse {
            url: self.url.to_string(),
            status: self.status.as_u16(),
            status_text: self.status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: self.bytes,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Split into two independent snapshots: one for the caller, one for the store.
    pub fn tee(self) -> (StoredResponse, StoredResponse) {
        let caller = self.into_stored();
        let stored = caller.clone();
        (caller, stored)
    }
}

/// Anything the strategies can fetch through.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Issue `request`, resolving to a response of any status or a transport error.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed network client.
pub struct FetchClient {
    http: Client,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Setup(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let url = request.url.clone();

        let mut builder = self.http.request(request.method.clone(), url.as_str());
        for (name, value) in request.headers.iter() {
            if !is_hop_by_hop(name.as_str()) {
                builder = builder.header(name, value);
            }
        }
        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, status, bytes, headers })
    }
}
