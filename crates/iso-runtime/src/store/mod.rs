//! Broker store adapter.
//!
//! The protocol needs five primitives from the shared store: set membership
//! listing, an atomic claim (pop from one set + add to another as a single
//! indivisible step), a queue append, a blocking pop with a deadline, and
//! key deletion. Anything offering those suffices; [`RedisStore`] is the
//! production implementation and [`MemoryStore`] backs tests and local
//! development.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// The atomic set/list primitives the protocol coordinates through.
///
/// `pop_front` signals "no value within the deadline" as `Ok(None)`, never
/// as an error: the distinction matters because the retry layer retries
/// errors but must pass `Ok(None)` straight through to the caller's timeout
/// handling.
#[async_trait]
pub trait BrokerStore: Send + Sync {
    /// Returns all members of a set (SMEMBERS).
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Atomically pops one arbitrary member from `free_key` and, if one was
    /// present, adds it to `busy_key`. The two steps MUST be indivisible so
    /// two concurrent callers can never claim the same member.
    async fn claim_member(&self, free_key: &str, busy_key: &str) -> Result<Option<String>>;

    /// Appends a value to the tail of a list (RPUSH).
    async fn push_back(&self, key: &str, value: &str) -> Result<()>;

    /// Pops the head of a list, blocking up to `timeout` (BLPOP). Returns
    /// `Ok(None)` if nothing arrived within the deadline.
    async fn pop_front(&self, key: &str, timeout: Duration) -> Result<Option<String>>;

    /// Deletes a key (DEL).
    async fn delete(&self, key: &str) -> Result<()>;
}
