//! Task transport - turns a queue push into a synchronous remote call.
//!
//! # Message Flow
//!
//! 1. Caller provides a live [`Session`], an action name, and args
//! 2. Transport generates a unique task ID and a derived result key
//! 3. The serialized task is RPUSHed onto the owning worker's queue
//!    (retried on transient store faults)
//! 4. Transport blocks on a BLPOP of the result key with the caller's
//!    deadline
//! 5. The worker pushes exactly one serialized result to that key
//! 6. The result is deserialized and handed back
//!
//! Commands on one session are strictly sequential: one in-flight task per
//! session. The unique-per-task result key would disambiguate even if that
//! were relaxed, but the documented contract remains one at a time.

use std::sync::Arc;
use std::time::Duration;

use iso_protocol::{Args, KeySpace, SessionBinding, TaskPayload, TaskResult};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::store::BrokerStore;

/// A live binding to one claimed browser instance, plus the session-scoped
/// init state.
///
/// `init_sent` is deliberately per-session, not process-wide: multiple
/// sessions in one process must never interfere with each other's
/// initialization.
#[derive(Debug)]
pub struct Session {
    binding: SessionBinding,
    init_sent: bool,
}

impl Session {
    /// Wraps a freshly acquired binding; no init has been sent yet.
    pub fn new(binding: SessionBinding) -> Self {
        Self {
            binding,
            init_sent: false,
        }
    }

    /// The underlying binding.
    pub fn binding(&self) -> &SessionBinding {
        &self.binding
    }

    /// Whether the session-establishment flags have already gone out.
    pub fn init_sent(&self) -> bool {
        self.init_sent
    }
}

/// Request/response transport over the broker store.
pub struct Transport {
    store: Arc<dyn BrokerStore>,
    keys: KeySpace,
}

impl Transport {
    pub fn new(store: Arc<dyn BrokerStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Sends one command to the session's worker and blocks for the
    /// correlated result.
    ///
    /// Session-establishment flags (video/record/profile) ride along only
    /// until the first successful round trip, to avoid redundant remote
    /// re-initialization.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no result arrived within `timeout` - the
    ///   task may still complete remotely; its orphaned result is never read
    /// - [`Error::Transport`] / [`Error::Store`] once the retry budget for
    ///   a store operation is exhausted
    /// - [`Error::Protocol`] if the worker's response cannot be parsed
    pub async fn send(
        &self,
        session: &mut Session,
        action: &str,
        args: Args,
        timeout: Duration,
    ) -> Result<TaskResult> {
        let task_id = Uuid::new_v4().simple().to_string();
        let result_key = self.keys.result_key(&task_id);
        let queue = self.keys.task_queue(&session.binding.worker_name);

        let mut payload = TaskPayload {
            task_id,
            browser_id: session.binding.browser_id.clone(),
            worker_name: session.binding.worker_name.clone(),
            action: action.to_string(),
            args,
            result_key: result_key.clone(),
            video: None,
            record: None,
            profile_id: None,
            browser_type: None,
        };

        if !session.init_sent {
            payload.video = session.binding.video.then_some(true);
            payload.record = session.binding.record.then_some(true);
            if let Some(profile_id) = &session.binding.profile_id {
                payload.profile_id = Some(profile_id.clone());
                payload.browser_type = Some(session.binding.browser_type.clone());
            }
        }

        let wire = serde_json::to_string(&payload)?;
        tracing::debug!(task_id = payload.task_id.as_str(), action, "pushing task");

        with_retry("task queue push", || self.store.push_back(&queue, &wire)).await?;

        let raw = with_retry("result pop", || self.store.pop_front(&result_key, timeout)).await?;

        let Some(raw) = raw else {
            // Single-use key; drop it so a late orphaned result does not
            // linger if the worker never consumed the task.
            let _ = self.store.delete(&result_key).await;
            return Err(Error::Timeout {
                action: action.to_string(),
                timeout,
            });
        };

        let result: TaskResult = serde_json::from_str(&raw)
            .map_err(|err| Error::Protocol(format!("unparseable worker response: {err}")))?;
        tracing::debug!(
            task_id = payload.task_id.as_str(),
            status = result.status.as_str(),
            "task answered"
        );

        session.init_sent = true;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    use super::*;
    use crate::store::MemoryStore;

    fn binding(video: bool) -> SessionBinding {
        SessionBinding {
            browser_id: "b1".into(),
            worker_name: "w1".into(),
            browser_type: "chrome".into(),
            video,
            record: false,
            profile_id: None,
        }
    }

    /// Answers the next task on w1's queue with `reply`, returning the
    /// payload the worker saw.
    fn stub_worker(
        store: Arc<MemoryStore>,
        keys: KeySpace,
        reply: serde_json::Value,
    ) -> JoinHandle<TaskPayload> {
        tokio::spawn(async move {
            let raw = store
                .pop_front(&keys.task_queue("w1"), Duration::from_secs(30))
                .await
                .unwrap()
                .expect("no task arrived");
            let task: TaskPayload = serde_json::from_str(&raw).unwrap();
            store
                .push_back(&task.result_key, &reply.to_string())
                .await
                .unwrap();
            task
        })
    }

    #[tokio::test]
    async fn round_trip_preserves_result_payload() {
        let store = Arc::new(MemoryStore::new());
        let keys = KeySpace::default();
        let transport = Transport::new(store.clone() as Arc<dyn BrokerStore>, keys.clone());
        let mut session = Session::new(binding(false));

        let worker = stub_worker(store, keys, json!({"status": "ok", "value": "Example"}));

        let mut args = Args::new();
        args.insert("selector".into(), json!("h1"));
        let result = transport
            .send(&mut session, "get_text", args, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(result.is_ok());
        assert_eq!(result.str_field("value"), Some("Example"));

        let seen = worker.await.unwrap();
        assert_eq!(seen.action, "get_text");
        assert_eq!(seen.args["selector"], json!("h1"));
        assert_eq!(seen.browser_id, "b1");
    }

    #[tokio::test]
    async fn init_flags_ride_only_the_first_call() {
        let store = Arc::new(MemoryStore::new());
        let keys = KeySpace::default();
        let transport = Transport::new(store.clone() as Arc<dyn BrokerStore>, keys.clone());
        let mut session = Session::new(binding(true));
        assert!(!session.init_sent());

        let worker = stub_worker(store.clone(), keys.clone(), json!({"status": "ok"}));
        transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(5))
            .await
            .unwrap();
        let first = worker.await.unwrap();
        assert_eq!(first.video, Some(true));
        assert!(session.init_sent());

        let worker = stub_worker(store, keys, json!({"status": "ok"}));
        transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(5))
            .await
            .unwrap();
        let second = worker.await.unwrap();
        assert_eq!(second.video, None);
    }

    #[tokio::test]
    async fn distinct_tasks_get_distinct_result_keys() {
        let store = Arc::new(MemoryStore::new());
        let keys = KeySpace::default();
        let transport = Transport::new(store.clone() as Arc<dyn BrokerStore>, keys.clone());
        let mut session = Session::new(binding(false));

        let worker = stub_worker(store.clone(), keys.clone(), json!({"status": "ok"}));
        transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(5))
            .await
            .unwrap();
        let first = worker.await.unwrap();

        let worker = stub_worker(store, keys, json!({"status": "ok"}));
        transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(5))
            .await
            .unwrap();
        let second = worker.await.unwrap();

        assert_ne!(first.task_id, second.task_id);
        assert_ne!(first.result_key, second.result_key);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_send_times_out_at_the_deadline() {
        let store = Arc::new(MemoryStore::new());
        let transport = Transport::new(store as Arc<dyn BrokerStore>, KeySpace::default());
        let mut session = Session::new(binding(false));

        let timeout = Duration::from_secs(2);
        let start = Instant::now();
        let err = transport
            .send(&mut session, "get_title", Args::new(), timeout)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() >= timeout);
        // No retry cycle applies to the no-value signal.
        assert!(start.elapsed() < timeout + Duration::from_secs(1));
        // A timed-out action must not flip the init state.
        assert!(!session.init_sent());
    }

    #[tokio::test]
    async fn malformed_response_is_a_protocol_error() {
        let store = Arc::new(MemoryStore::new());
        let keys = KeySpace::default();
        let transport = Transport::new(store.clone() as Arc<dyn BrokerStore>, keys.clone());
        let mut session = Session::new(binding(false));

        let stub = {
            let store = Arc::clone(&store);
            let keys = keys.clone();
            tokio::spawn(async move {
                let raw = store
                    .pop_front(&keys.task_queue("w1"), Duration::from_secs(30))
                    .await
                    .unwrap()
                    .unwrap();
                let task: TaskPayload = serde_json::from_str(&raw).unwrap();
                store.push_back(&task.result_key, "not json").await.unwrap();
            })
        };

        let err = transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        stub.await.unwrap();
    }

    /// Store wrapper whose first `fail_pushes` queue appends fail with a
    /// transport error.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        fail_pushes: AtomicU32,
    }

    #[async_trait]
    impl BrokerStore for FlakyStore {
        async fn set_members(&self, key: &str) -> Result<Vec<String>> {
            self.inner.set_members(key).await
        }

        async fn claim_member(&self, free_key: &str, busy_key: &str) -> Result<Option<String>> {
            self.inner.claim_member(free_key, busy_key).await
        }

        async fn push_back(&self, key: &str, value: &str) -> Result<()> {
            if self
                .fail_pushes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(Error::Transport("connection reset".into()));
            }
            self.inner.push_back(key, value).await
        }

        async fn pop_front(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
            self.inner.pop_front(key, timeout).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn push_retries_transient_faults_then_succeeds() {
        let memory = Arc::new(MemoryStore::new());
        let keys = KeySpace::default();
        let flaky = Arc::new(FlakyStore {
            inner: Arc::clone(&memory),
            fail_pushes: AtomicU32::new(2),
        });
        let transport = Transport::new(flaky as Arc<dyn BrokerStore>, keys.clone());
        let mut session = Session::new(binding(false));

        let worker = stub_worker(memory, keys, json!({"status": "ok"}));

        let start = Instant::now();
        let result = transport
            .send(&mut session, "get_title", Args::new(), Duration::from_secs(30))
            .await
            .unwrap();

        assert!(result.is_ok());
        // Elapsed reflects the two backoff intervals (0.2s + 0.4s).
        assert!(start.elapsed() >= Duration::from_millis(600));
        assert!(start.elapsed() < Duration::from_secs(2));
        worker.await.unwrap();
    }
}
