//! Key-space naming shared between clients and workers.
//!
//! Every key this system touches lives under a single prefix so the broker
//! store can be shared with unrelated usage. Workers consume a per-worker
//! task queue; each task gets its own single-use result key.

/// Default namespace prefix for all broker keys.
pub const DEFAULT_PREFIX: &str = "ISOAUTOMATE:";

/// Computes the broker keys used by the protocol under a fixed prefix.
///
/// The layout, for prefix `P`:
/// - `P:workers` - set of live worker names (written by workers)
/// - `P:<worker>:<type>:free` / `P:<worker>:<type>:busy` - instance sets
/// - `P:<worker>:tasks` - the worker's task queue
/// - `P:result:<task_id>` - single-use result list for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl KeySpace {
    /// Creates a key space under the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The set of live worker names. Membership here is the sole authority
    /// for "this worker exists".
    pub fn workers_set(&self) -> String {
        format!("{}workers", self.prefix)
    }

    /// The free-instance set for one (worker, browser-type) pair.
    pub fn free_set(&self, worker: &str, browser_type: &str) -> String {
        format!("{}{}:{}:free", self.prefix, worker, browser_type)
    }

    /// The busy-instance set for one (worker, browser-type) pair.
    pub fn busy_set(&self, worker: &str, browser_type: &str) -> String {
        format!("{}{}:{}:busy", self.prefix, worker, browser_type)
    }

    /// The task queue consumed by one worker.
    pub fn task_queue(&self, worker: &str) -> String {
        format!("{}{}:tasks", self.prefix, worker)
    }

    /// The single-use result key for one task.
    pub fn result_key(&self, task_id: &str) -> String {
        format!("{}result:{}", self.prefix, task_id)
    }
}
