//! Task and result payloads - the two halves of one remote call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended action arguments: an ordered string-keyed map of JSON values.
///
/// The action catalog is large and owned by the worker side, so args are
/// deliberately schema-free; typed accessors belong at the integration
/// layer, not here.
pub type Args = Map<String, Value>;

/// Default wait for a worker response to an ordinary command.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(60);

/// Video finalization is slow; `stop_video` gets an extended window.
pub const STOP_VIDEO_TIMEOUT: Duration = Duration::from_secs(120);

/// Extended window for finalizing a DOM recording.
pub const STOP_RECORD_TIMEOUT: Duration = Duration::from_secs(60);

/// Captcha solving regularly takes minutes.
pub const SOLVE_CAPTCHA_TIMEOUT: Duration = Duration::from_secs(180);

/// One outbound command, RPUSHed onto the owning worker's task queue.
///
/// Ephemeral: consumed by exactly one worker, answered by exactly one
/// response on `result_key`, then discarded. The optional tail fields are
/// session-establishment flags and are serialized only on the first call of
/// a session's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Globally unique per call.
    pub task_id: String,
    /// Browser instance the action targets.
    pub browser_id: String,
    /// Worker that owns the instance.
    pub worker_name: String,
    /// Action name from the worker-side catalog.
    pub action: String,
    /// Schema-free action arguments.
    pub args: Args,
    /// Single-use key the worker answers on.
    pub result_key: String,
    /// Start video capture (init call only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
    /// Start DOM recording (init call only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<bool>,
    /// Profile to load (init call only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Browser engine, sent alongside `profile_id` (init call only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_type: Option<String>,
}

/// One worker response, BLPOPed from a task's result key.
///
/// Only `status` is interpreted by the core; everything else is
/// action-specific and passed through to the caller untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskResult {
    /// `"ok"`, `"fail"`, or worker-defined free text.
    pub status: String,
    /// Worker-side error description, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Action-specific payload fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskResult {
    /// True when the worker reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Looks up an action-specific payload field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Looks up an action-specific payload field as a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}
