//! Immutable per-version worker configuration.
//!
//! Built once from `AppConfig` and shared by every handler of a worker, so a
//! test can hand a worker an alternate manifest without touching globals.

use pwacache_core::{AppConfig, Error, NotificationConfig, RequestKey};
use url::Url;

use crate::router::RoutePolicy;

/// The two generations a worker version owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationNames {
    pub precache: String,
    pub runtime: String,
}

impl GenerationNames {
    pub fn new(precache: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self { precache: precache.into(), runtime: runtime.into() }
    }

    /// Whether `name` is one of this version's generations.
    pub fn contains(&self, name: &str) -> bool {
        self.precache == name || self.runtime == name
    }
}

/// Ordered, fixed list of site-relative paths precached at install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    paths: Vec<String>,
}

impl PrecacheManifest {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Resolve every entry against the origin, keeping manifest order.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<(String, Url)>, Error> {
        self.paths
            .iter()
            .map(|path| {
                pwacache_client::resolve(origin, path)
                    .map(|url| (path.clone(), url))
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect()
    }
}

/// Everything a worker version needs to run.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub version: String,
    pub origin: Url,
    pub generations: GenerationNames,
    pub manifest: PrecacheManifest,
    pub offline_path: String,
    pub routes: RoutePolicy,
    pub skip_waiting_on_install: bool,
    pub notification: NotificationConfig,
    /// Bodies larger than this are served but never written by a strategy.
    pub max_entry_bytes: usize,
}

impl WorkerConfig {
    /// Derive the worker configuration for the version described by `config`.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = pwacache_client::canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            version: config.version.clone(),
            origin,
            generations: GenerationNames::new(config.precache_generation(), config.runtime_generation()),
            manifest: PrecacheManifest::new(config.precache_urls.iter().cloned()),
            offline_path: config.offline_path.clone(),
            routes: RoutePolicy::from_app(config)?,
            skip_waiting_on_install: config.skip_waiting_on_install,
            notification: config.notification.clone(),
            max_entry_bytes: config.max_bytes,
        })
    }

    /// Store key of the offline fallback page.
    pub fn offline_key(&self) -> Result<RequestKey, Error> {
        let url = pwacache_client::resolve(&self.origin, &self.offline_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.offline_path)))?;
        Ok(RequestKey::get(url.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_app_defaults() {
        let config = WorkerConfig::from_app(&AppConfig::default()).unwrap();
        assert_eq!(config.version, "49");
        assert_eq!(config.origin.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.generations.precache, "extinct-mammals-v49");
        assert_eq!(config.generations.runtime, "extinct-mammals-runtime-v49");
        assert!(config.manifest.contains("/offline/"));
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.max_entry_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_generation_names_contains() {
        let names = GenerationNames::new("shell-v50", "runtime-v50");
        assert!(names.contains("shell-v50"));
        assert!(names.contains("runtime-v50"));
        assert!(!names.contains("shell-v49"));
    }

    #[test]
    fn test_manifest_resolve_keeps_order() {
        let manifest = PrecacheManifest::new(["/", "/static/css/style.css", "/offline/"]);
        let origin = Url::parse("https://mammals.example").unwrap();
        let resolved = manifest.resolve(&origin).unwrap();
        let urls: Vec<_> = resolved.iter().map(|(_, u)| u.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://mammals.example/",
                "https://mammals.example/static/css/style.css",
                "https://mammals.example/offline/"
            ]
        );
    }

    #[test]
    fn test_manifest_resolve_rejects_relative_entry() {
        let manifest = PrecacheManifest::new(["/", "static/x.css"]);
        let origin = Url::parse("https://mammals.example").unwrap();
        assert!(matches!(manifest.resolve(&origin), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_offline_key() {
        let config = WorkerConfig::from_app(&AppConfig::default()).unwrap();
        let key = config.offline_key().unwrap();
        assert_eq!(key.url, "http://127.0.0.1:8000/offline/");
        assert_eq!(key.method, "GET");
    }
}
