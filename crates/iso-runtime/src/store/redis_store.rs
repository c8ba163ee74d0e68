//! Redis-backed broker store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::error::Result;
use crate::store::BrokerStore;

/// The claim must run server-side as one indivisible step: SPOP an
/// arbitrary free instance and, if one existed, SADD it to the busy set.
const CLAIM_SCRIPT: &str = r#"
local bid = redis.call('SPOP', KEYS[1])
if bid then
    redis.call('SADD', KEYS[2], bid)
    return bid
end
return nil
"#;

/// Broker store over a Redis server.
///
/// Uses one multiplexed async connection; clones of it share the underlying
/// socket, so the store is cheap to use from `&self`.
pub struct RedisStore {
    conn: MultiplexedConnection,
    claim: Script,
}

impl RedisStore {
    /// Connects to the given Redis URL (`redis://` / `rediss://`) and
    /// verifies the link with a PING before returning.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self {
            conn,
            claim: Script::new(CLAIM_SCRIPT),
        })
    }
}

#[async_trait]
impl BrokerStore for RedisStore {
    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn claim_member(&self, free_key: &str, busy_key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let claimed: Option<String> = self
            .claim
            .key(free_key)
            .key(busy_key)
            .invoke_async(&mut conn)
            .await?;
        Ok(claimed)
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(key, value).await?;
        Ok(())
    }

    async fn pop_front(&self, key: &str, timeout: Duration) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        // BLPOP with timeout 0 blocks forever; the deadline must always be
        // explicit here.
        let secs = timeout.as_secs_f64().max(0.001);
        let popped: Option<(String, String)> = conn.blpop(key, secs).await?;
        Ok(popped.map(|(_key, value)| value))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
