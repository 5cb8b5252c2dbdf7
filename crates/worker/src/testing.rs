//! In-process network stub and fixtures shared by the worker tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use pwacache_client::{FetchError, FetchRequest, FetchResponse, HeaderMap, Network, StatusCode, headers};
use pwacache_core::{AppConfig, CacheDb, CacheHandle, CacheStore, Error, RequestKey, StoredResponse};
use url::Url;

use crate::config::{PrecacheManifest, WorkerConfig};

pub(crate) const ORIGIN: &str = "https://mammals.example";

/// Scripted network keyed by path-and-query.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, (u16, String)>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `path`.
    pub(crate) fn serve(&self, path: &str, status: u16, body: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    /// Make every request for `path` fail at the transport level.
    pub(crate) fn fail(&self, path: &str) -> &Self {
        self.failing.lock().unwrap().insert(path.to_string());
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<FetchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let key = path_and_query(&request.url);
        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&key) {
            return Err(FetchError::Timeout);
        }

        let (status, body) = self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or((404, "not found".to_string()));

        let mut response_headers = HeaderMap::new();
        response_headers.insert(headers::CONTENT_TYPE, "text/html; charset=utf-8".parse().unwrap());

        Ok(FetchResponse {
            url: request.url.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            bytes: Bytes::from(body),
            headers: response_headers,
        })
    }
}

pub(crate) const MANIFEST: &[&str] = &["/", "/static/css/style.css", "/static/js/script.js", "/offline/"];

/// Worker config for version `version` with a small manifest.
pub(crate) fn worker_config(version: &str) -> WorkerConfig {
    let app = AppConfig { origin: ORIGIN.to_string(), version: version.to_string(), ..Default::default() };
    let mut config = WorkerConfig::from_app(&app).unwrap();
    config.manifest = PrecacheManifest::new(MANIFEST.iter().copied());
    config
}

/// Network that serves every manifest entry with a 200.
pub(crate) fn network_serving_manifest() -> Arc<StubNetwork> {
    let network = StubNetwork::new();
    for path in MANIFEST {
        network.serve(path, 200, &format!("precached {path}"));
    }
    Arc::new(network)
}

pub(crate) async fn memory_store() -> Arc<CacheDb> {
    Arc::new(CacheDb::open_in_memory().await.unwrap())
}

/// Store whose disk is effectively full: reads work, but it cannot create
/// generations or write entries.
pub(crate) struct ReadOnlyStore {
    inner: CacheDb,
}

fn writes_disabled() -> Error {
    Error::Unsupported("writes disabled".to_string())
}

#[async_trait::async_trait]
impl CacheStore for ReadOnlyStore {
    async fn open(&self, name: &str) -> Result<CacheHandle, Error> {
        if !self.inner.has(name).await? {
            return Err(writes_disabled());
        }
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn match_request(&self, handle: &CacheHandle, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.inner.match_request(handle, key).await
    }

    async fn put(&self, _: &CacheHandle, _: &RequestKey, _: &StoredResponse) -> Result<(), Error> {
        Err(writes_disabled())
    }

    async fn put_all(&self, _: &str, _: Vec<(RequestKey, StoredResponse)>) -> Result<(), Error> {
        Err(writes_disabled())
    }

    async fn delete(&self, _: &str) -> Result<bool, Error> {
        Err(writes_disabled())
    }

    async fn keys(&self) -> Result<BTreeSet<String>, Error> {
        self.inner.keys().await
    }

    async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        CacheStore::entry_count(&self.inner, name).await
    }
}

/// Read-only store holding an empty `extinct-mammals-v49` precache.
pub(crate) async fn read_only_store() -> Arc<ReadOnlyStore> {
    let inner = CacheDb::open_in_memory().await.unwrap();
    inner.open("extinct-mammals-v49").await.unwrap();
    Arc::new(ReadOnlyStore { inner })
}

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn get(path: &str) -> FetchRequest {
    FetchRequest::get(url(path))
}

pub(crate) fn stored(path: &str, body: &str) -> StoredResponse {
    StoredResponse {
        url: url(path).to_string(),
        status: 200,
        status_text: "OK".to_string(),
        headers: vec![("Content-Type".to_string(), "text/html".to_string())],
        body: Bytes::from(body.to_string()),
        stored_at: "2026-01-01T00:00:00+00:00".to_string(),
    }
}

/// Seed a single entry into a generation.
pub(crate) async fn seed(store: &dyn CacheStore, generation: &str, path: &str, body: &str) {
    let handle = store.open(generation).await.unwrap();
    store
        .put(&handle, &RequestKey::get(url(path).as_str()), &stored(path, body))
        .await
        .unwrap();
}

/// Look up an entry without going through a strategy.
pub(crate) async fn lookup(store: &dyn CacheStore, generation: &str, path: &str) -> Option<StoredResponse> {
    if !store.has(generation).await.unwrap() {
        return None;
    }
    let handle = store.open(generation).await.unwrap();
    store
        .match_request(&handle, &RequestKey::get(url(path).as_str()))
        .await
        .unwrap()
}
