//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Non-GET methods pass through untouched.
//! 2. Excluded prefixes (admin, auth) pass through untouched.
//! 3. Static prefix, media prefix, or an image/icon extension → cache-first.
//! 4. Everything else → network-first.
//!
//! Rule 2 runs before rule 3 so an excluded path is never cached even when it
//! ends in an image extension.

use pwacache_client::Method;
use pwacache_core::{AppConfig, Error};
use regex::Regex;
use url::Url;

/// Why a request is left to the network without interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    NonGet,
    Excluded,
    /// No activated worker governs the request.
    NotControlled,
}

/// Resource class derived from the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    StaticAsset,
    MediaAsset,
    ImageByExtension,
    Dynamic,
}

/// Which fetch strategy serves a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    CacheFirst,
    NetworkFirst,
}

impl RouteClass {
    pub fn strategy(self) -> StrategyKind {
        match self {
            RouteClass::StaticAsset | RouteClass::MediaAsset | RouteClass::ImageByExtension => StrategyKind::CacheFirst,
            RouteClass::Dynamic => StrategyKind::NetworkFirst,
        }
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(PassReason),
    Intercept(RouteClass),
}

/// Compiled routing rules.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    excluded_prefixes: Vec<String>,
    static_prefix: String,
    media_prefix: String,
    image_pattern: Regex,
}

impl RoutePolicy {
    /// Build a policy; `extensions` are bare suffixes such as `png`.
    pub fn new(
        excluded_prefixes: Vec<String>, static_prefix: impl Into<String>, media_prefix: impl Into<String>,
        extensions: &[String],
    ) -> Result<Self, Error> {
        if extensions.is_empty() {
            return Err(Error::InvalidInput("at least one image extension is required".into()));
        }

        let alternatives = extensions.iter().map(|e| regex::escape(e)).collect::<Vec<_>>().join("|");
        let image_pattern = Regex::new(&format!(r"(?i)\.({alternatives})$"))
            .map_err(|e| Error::InvalidInput(format!("invalid image extension pattern: {e}")))?;

        Ok(Self {
            excluded_prefixes,
            static_prefix: static_prefix.into(),
            media_prefix: media_prefix.into(),
            image_pattern,
        })
    }

    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        Self::new(
            config.excluded_prefixes.clone(),
            config.static_prefix.clone(),
            config.media_prefix.clone(),
            &config.image_extensions,
        )
    }

    /// Classify a request by method and URL path.
    pub fn classify(&self, method: &Method, url: &Url) -> Route {
        if *method != Method::GET {
            return Route::Passthrough(PassReason::NonGet);
        }

        let path = url.path();

        if self.excluded_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return Route::Passthrough(PassReason::Excluded);
        }

        if path.starts_with(&self.static_prefix) {
            Route::Intercept(RouteClass::StaticAsset)
        } else if path.starts_with(&self.media_prefix) {
            Route::Intercept(RouteClass::MediaAsset)
        } else if self.image_pattern.is_match(path) {
            Route::Intercept(RouteClass::ImageByExtension)
        } else {
            Route::Intercept(RouteClass::Dynamic)
        }
    }
}
