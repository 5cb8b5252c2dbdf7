//! Push notifications and background sync.
//!
//! Push dispatch happens elsewhere; this only shapes what gets displayed.
//! Background sync has no queue behind it, so the one recognised tag reports
//! `Unsupported` instead of pretending to succeed.

use pwacache_core::{Error, NotificationConfig};
use serde::Serialize;
use url::Url;

/// Tag the site registers for deferred favourite updates.
pub const FAVORITES_SYNC_TAG: &str = "sync-favorites";

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
    pub require_interaction: bool,
}

/// Build the notification for a push carrying `payload`.
pub fn notification_for(config: &NotificationConfig, payload: Option<&str>) -> Notification {
    let body = match payload.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => config.default_body.clone(),
    };

    Notification {
        title: config.title.clone(),
        body,
        icon: config.icon.clone(),
        badge: config.badge.clone(),
        vibrate: config.vibrate.clone(),
        tag: config.tag.clone(),
        require_interaction: false,
    }
}

/// URL opened when a notification is clicked.
pub fn click_target(config: &NotificationConfig, origin: &Url) -> Result<Url, Error> {
    pwacache_client::resolve(origin, &config.open_url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.open_url)))
}

/// Handle a background-sync event.
pub fn handle_sync(tag: &str) -> Result<(), Error> {
    if tag == FAVORITES_SYNC_TAG {
        tracing::warn!(tag, "background sync requested but no sync queue exists");
        return Err(Error::Unsupported(format!("background sync '{tag}'")));
    }

    tracing::debug!(tag, "ignoring unknown sync tag");
    Ok(())
}
