//! In-memory broker store for tests and local development.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::Result;
use crate::store::BrokerStore;

#[derive(Default)]
struct Inner {
    sets: HashMap<String, BTreeSet<String>>,
    lists: HashMap<String, VecDeque<String>>,
}

/// Process-local [`BrokerStore`] with the same atomicity guarantees as the
/// Redis implementation: the claim runs under one lock acquisition, and the
/// blocking pop wakes on pushes instead of polling.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a set member directly. Test/setup helper standing in for the
    /// writes workers perform themselves in production.
    pub fn insert_set_member(&self, key: &str, member: &str) {
        self.inner
            .lock()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
    }

    /// Snapshot of a list's contents, head first.
    pub fn list_contents(&self, key: &str) -> Vec<String> {
        self.inner
            .lock()
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn try_pop(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let value = inner.lists.get_mut(key)?.pop_front();
        if inner.lists.get(key).is_some_and(VecDeque::is_empty) {
            inner.lists.remove(key);
        }
        value
    }
}

#[async_trait]
impl BrokerStore for MemoryStore {
    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn claim_member(&self, free_key: &str, busy_key: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock();
        let Some(free) = inner.sets.get_mut(free_key) else {
            return Ok(None);
        };
        let Some(member) = free.iter().next().cloned() else {
            return Ok(None);
        };
        free.remove(&member);
        inner
            .sets
            .entry(busy_key.to_string())
            .or_default()
            .insert(member.clone());
        Ok(Some(member))
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .lock()
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn pop_front(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register for wakeups before checking, so a push between the
            // check and the wait is never missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(value) = self.try_pop(key) {
                return Ok(Some(value));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.sets.remove(key);
        inner.lists.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn claim_moves_member_from_free_to_busy() {
        let store = MemoryStore::new();
        store.insert_set_member("free", "b1");

        let claimed = store.claim_member("free", "busy").await.unwrap();
        assert_eq!(claimed.as_deref(), Some("b1"));
        assert!(store.set_members("free").await.unwrap().is_empty());
        assert_eq!(store.set_members("busy").await.unwrap(), vec!["b1"]);

        // Second claim finds nothing.
        assert_eq!(store.claim_member("free", "busy").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn pop_front_times_out_empty() {
        let store = MemoryStore::new();
        let start = Instant::now();
        let popped = store
            .pop_front("nothing", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(popped, None);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn push_wakes_blocked_pop() {
        let store = Arc::new(MemoryStore::new());

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(
                async move { store.pop_front("queue", Duration::from_secs(5)).await },
            )
        };

        tokio::task::yield_now().await;
        store.push_back("queue", "hello").await.unwrap();

        let popped = waiter.await.unwrap().unwrap();
        assert_eq!(popped.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn pop_front_is_fifo() {
        let store = MemoryStore::new();
        store.push_back("q", "a").await.unwrap();
        store.push_back("q", "b").await.unwrap();
        let first = store.pop_front("q", Duration::from_millis(10)).await.unwrap();
        let second = store.pop_front("q", Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.as_deref(), Some("a"));
        assert_eq!(second.as_deref(), Some("b"));
    }
}
