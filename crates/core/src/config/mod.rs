//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PWA_CACHE_*)
//! 2. TOML config file (if PWA_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PWA_CACHE_*, `__` separates nested keys)
/// 2. TOML config file (if PWA_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the intercepting proxy listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Base URL of the content server requests are forwarded to.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every generation name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployment version embedded in generation names.
    ///
    /// Bumping it is the only way old generations get reaped.
    #[serde(default = "default_version")]
    pub version: String,

    /// Site-relative paths fetched into the precache generation at install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Page served when neither network nor cache can answer.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    #[serde(default = "default_media_prefix")]
    pub media_prefix: String,

    /// Path prefixes that are never intercepted (admin and auth pages).
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// File extensions, without the dot, served cache-first wherever they live.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest response body written to the cache at request time. Bigger
    /// responses are still served, just not stored.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Take over immediately once precaching succeeds.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Seconds between install retries while no worker is active (0 disables).
    #[serde(default = "default_install_retry_secs")]
    pub install_retry_secs: u64,

    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Fixed shape of notifications raised by push events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    /// Body used when a push carries no text.
    pub default_body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
    /// Page opened when the notification is clicked.
    pub open_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Extinct Mammals".into(),
            default_body: "A new update is available".into(),
            icon: "/static/images/icons/icon-192x192.png".into(),
            badge: "/static/images/icons/icon-72x72.png".into(),
            vibrate: vec![200, 100, 200],
            tag: "extinct-mammals-notification".into(),
            open_url: "/".into(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pwa-cache.sqlite")
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_cache_prefix() -> String {
    "extinct-mammals".into()
}

fn default_version() -> String {
    "49".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/static/css/style.css",
        "/static/css/alerts.css",
        "/static/css/cookie-consent.css",
        "/static/css/buttons_fix.css",
        "/static/css/error-pages.css",
        "/static/js/script.js",
        "/static/js/cookie-consent.js",
        "/static/manifest.json",
        "/offline/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_path() -> String {
    "/offline/".into()
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_media_prefix() -> String {
    "/media/".into()
}

fn default_excluded_prefixes() -> Vec<String> {
    ["/admin/", "/accounts/login/", "/accounts/logout/", "/accounts/register/"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "svg", "webp", "ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    "pwa-cache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    26_214_400 // 25MB
}

fn default_true() -> bool {
    true
}

fn default_install_retry_secs() -> u64 {
    3600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            listen_addr: default_listen_addr(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            precache_urls: default_precache_urls(),
            offline_path: default_offline_path(),
            static_prefix: default_static_prefix(),
            media_prefix: default_media_prefix(),
            excluded_prefixes: default_excluded_prefixes(),
            image_extensions: default_image_extensions(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            skip_waiting_on_install: true,
            install_retry_secs: default_install_retry_secs(),
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the generation populated at install time.
    pub fn precache_generation(&self) -> String {
        format!("{}-v{}", self.cache_prefix, self.version)
    }

    /// Name of the generation populated from live responses.
    pub fn runtime_generation(&self) -> String {
        format!("{}-runtime-v{}", self.cache_prefix, self.version)
    }

    /// Interval between install retries, if enabled.
    pub fn install_retry_interval(&self) -> Option<Duration> {
        (self.install_retry_secs > 0).then(|| Duration::from_secs(self.install_retry_secs))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PWA_CACHE_`
    /// 2. TOML file from `PWA_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PWA_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PWA_CACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./pwa-cache.sqlite"));
        assert_eq!(config.user_agent, "pwa-cache/0.1");
        assert_eq!(config.version, "49");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.precache_urls.len(), 10);
        assert!(config.precache_urls.contains(&config.offline_path));
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.notification.open_url, "/");
    }

    #[test]
    fn test_generation_names() {
        let config = AppConfig::default();
        assert_eq!(config.precache_generation(), "extinct-mammals-v49");
        assert_eq!(config.runtime_generation(), "extinct-mammals-runtime-v49");

        let bumped = AppConfig { version: "50".into(), ..Default::default() };
        assert_eq!(bumped.precache_generation(), "extinct-mammals-v50");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_install_retry_interval() {
        let config = AppConfig::default();
        assert_eq!(config.install_retry_interval(), Some(Duration::from_secs(3600)));

        let disabled = AppConfig { install_retry_secs: 0, ..Default::default() };
        assert_eq!(disabled.install_retry_interval(), None);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            version = "50"
            origin = "https://mammals.example"

            [notification]
            title = "Mammals"
            "#,
        ));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.version, "50");
        assert_eq!(config.origin, "https://mammals.example");
        assert_eq!(config.notification.title, "Mammals");
        assert_eq!(config.notification.vibrate, vec![200, 100, 200]);
    }
}
