//! The session binding between a client and one claimed browser instance.

use serde::{Deserialize, Serialize};

/// Binding produced by a successful acquisition.
///
/// Identifies one remote browser instance, the worker that owns it, and the
/// session-establishment flags the worker needs to materialize a persistent
/// environment (video capture, DOM recording, a stored profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBinding {
    /// Opaque identifier of the claimed browser instance.
    pub browser_id: String,
    /// Name of the worker that owns the instance.
    #[serde(rename = "worker")]
    pub worker_name: String,
    /// Browser engine requested at acquisition ("chrome", "firefox", ...).
    pub browser_type: String,
    /// Whether video capture was requested for this session.
    pub video: bool,
    /// Whether DOM recording (rrweb) was requested for this session.
    pub record: bool,
    /// Persistent profile to load, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

impl SessionBinding {
    /// True if the session needs the worker to materialize a persistent
    /// environment before the first real action.
    pub fn wants_persistence(&self) -> bool {
        self.video || self.record || self.profile_id.is_some()
    }
}
