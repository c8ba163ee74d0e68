//! Acquisition engine - atomically claims one free browser instance.

use iso_protocol::KeySpace;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::store::BrokerStore;

/// Claims one free browser instance of `browser_type` from the pool.
///
/// Scans the worker set in a freshly randomized order (load spreading is
/// statistical across calls, not per-call fair) and asks the store for an
/// atomic claim per worker. The pop-from-free plus add-to-busy runs as one
/// indivisible step inside the store, so two concurrent callers can never
/// receive the same instance; this function holds no locks of its own.
///
/// # Errors
///
/// - [`Error::NoWorkers`] if the pool set is empty
/// - [`Error::NoBrowserAvailable`] if no worker had a free instance of the
///   requested type after the full scan
pub async fn claim_instance(
    store: &dyn BrokerStore,
    keys: &KeySpace,
    browser_type: &str,
) -> Result<(String, String)> {
    let mut workers = store.set_members(&keys.workers_set()).await?;
    if workers.is_empty() {
        return Err(Error::NoWorkers);
    }

    // Re-shuffled every call; no cached order.
    workers.shuffle(&mut rand::rng());

    for worker in &workers {
        let free = keys.free_set(worker, browser_type);
        let busy = keys.busy_set(worker, browser_type);
        if let Some(browser_id) = store.claim_member(&free, &busy).await? {
            tracing::info!(
                worker = worker.as_str(),
                browser_id = browser_id.as_str(),
                browser_type,
                "claimed browser instance"
            );
            return Ok((worker.clone(), browser_id));
        }
    }

    Err(Error::NoBrowserAvailable {
        browser_type: browser_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn pool() -> (Arc<MemoryStore>, KeySpace) {
        (Arc::new(MemoryStore::new()), KeySpace::default())
    }

    fn seed_worker(store: &MemoryStore, keys: &KeySpace, worker: &str, free: &[&str]) {
        store.insert_set_member(&keys.workers_set(), worker);
        for id in free {
            store.insert_set_member(&keys.free_set(worker, "chrome"), id);
        }
    }

    #[tokio::test]
    async fn empty_pool_fails_with_no_workers() {
        let (store, keys) = pool();
        let err = claim_instance(store.as_ref(), &keys, "chrome")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoWorkers));
    }

    #[tokio::test]
    async fn workers_without_free_instances_fail_with_no_browser() {
        let (store, keys) = pool();
        seed_worker(&store, &keys, "w1", &[]);
        seed_worker(&store, &keys, "w2", &[]);

        let err = claim_instance(store.as_ref(), &keys, "chrome")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoBrowserAvailable { browser_type } if browser_type == "chrome"));
    }

    #[tokio::test]
    async fn wrong_type_is_not_claimed() {
        let (store, keys) = pool();
        store.insert_set_member(&keys.workers_set(), "w1");
        store.insert_set_member(&keys.free_set("w1", "firefox"), "f1");

        let err = claim_instance(store.as_ref(), &keys, "chrome")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoBrowserAvailable { .. }));
    }

    #[tokio::test]
    async fn claim_marks_instance_busy() {
        let (store, keys) = pool();
        seed_worker(&store, &keys, "w1", &["b1"]);

        let (worker, browser_id) = claim_instance(store.as_ref(), &keys, "chrome")
            .await
            .unwrap();
        assert_eq!(worker, "w1");
        assert_eq!(browser_id, "b1");
        assert!(
            store
                .set_members(&keys.free_set("w1", "chrome"))
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            store
                .set_members(&keys.busy_set("w1", "chrome"))
                .await
                .unwrap(),
            vec!["b1"]
        );
    }

    #[tokio::test]
    async fn concurrent_claims_never_share_an_instance() {
        let (store, keys) = pool();
        seed_worker(&store, &keys, "w1", &["b1", "b2"]);
        seed_worker(&store, &keys, "w2", &["b3"]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let keys = keys.clone();
            handles.push(tokio::spawn(async move {
                claim_instance(store.as_ref(), &keys, "chrome").await
            }));
        }

        let mut claimed = HashSet::new();
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok((_, browser_id)) => {
                    // Each success must be a distinct instance.
                    assert!(claimed.insert(browser_id));
                }
                Err(Error::NoBrowserAvailable { .. }) => exhausted += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Successes equal the free instances available; everyone else was
        // turned away.
        assert_eq!(claimed.len(), 3);
        assert_eq!(exhausted, 5);
    }
}
