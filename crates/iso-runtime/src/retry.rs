//! Bounded retry with exponential backoff for single store operations.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Additional attempts after the first failure (4 attempts total).
const MAX_RETRIES: u32 = 3;

/// First backoff interval; doubles each retry (0.2s, 0.4s, 0.8s).
const BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Runs one store operation, retrying transient faults.
///
/// Only `Err` results are retried. A blocking pop that found no value
/// returns `Ok(None)` and passes straight through - that is the caller's
/// timeout semantics, not a transient fault.
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_RETRIES => {
                attempt += 1;
                let backoff = BACKOFF_BASE * (1u32 << (attempt - 1));
                tracing::warn!(
                    "{what} failed (attempt {attempt}/{MAX_RETRIES}), retrying in {backoff:?}: {err}"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(err) => {
                tracing::error!("{what} failed after {MAX_RETRIES} retries: {err}");
                return Err(err);
            }
        }
    }
}
