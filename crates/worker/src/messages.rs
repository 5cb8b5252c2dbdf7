//! Control messages posted by governed pages.

use pwacache_core::Error;
use serde::{Deserialize, Serialize};

/// A control command. Delivery is fire-and-forget and both are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    /// Promote a waiting worker without waiting for pages to close.
    SkipWaiting,
    /// Delete every generation regardless of version.
    ClearCache,
}

impl ControlMessage {
    /// Parse a JSON message body such as `{"action":"skipWaiting"}`.
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| Error::InvalidInput(format!("unrecognised control message: {e}")))
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum MessageOutcome {
    /// A waiting worker took control.
    Promoted { version: String },
    /// No waiting worker; the request was recorded.
    SkipWaitingRecorded,
    Cleared { generations: Vec<String> },
}
