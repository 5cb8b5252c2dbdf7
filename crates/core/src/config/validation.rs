//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_name_part(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(field, "must not contain whitespace"));
    }
    Ok(())
}

fn check_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("{value:?} must start with '/'") });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` or `cache_prefix` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - any configured path does not start with `/`
    /// - `precache_urls` does not include `offline_path`
    /// - `image_extensions` is empty or has non-alphanumeric entries
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name_part("version", &self.version)?;
        check_name_part("cache_prefix", &self.cache_prefix)?;

        let origin = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "scheme must be http or https"));
        }

        check_path("offline_path", &self.offline_path)?;
        check_path("static_prefix", &self.static_prefix)?;
        check_path("media_prefix", &self.media_prefix)?;
        for path in &self.precache_urls {
            check_path("precache_urls", path)?;
        }
        for prefix in &self.excluded_prefixes {
            check_path("excluded_prefixes", prefix)?;
        }

        if !self.precache_urls.contains(&self.offline_path) {
            return Err(ConfigError::Missing {
                field: "precache_urls".into(),
                hint: format!("the offline page {} must be precached", self.offline_path),
            });
        }

        if self.image_extensions.is_empty() {
            return Err(invalid("image_extensions", "must not be empty"));
        }
        if self
            .image_extensions
            .iter()
            .any(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(invalid("image_extensions", "entries must be bare alphanumeric extensions"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.excluded_prefixes.iter().any(|p| p == "/") {
            tracing::warn!("excluded_prefixes contains '/'; no request will be intercepted");
        }

        Ok(())
    }
}
