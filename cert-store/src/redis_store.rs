//! Redis/Valkey-backed Store Adapter
//!
//! Backed by a [`redis::aio::ConnectionManager`], which reconnects
//! transparently and is cheap to clone — this is what makes it safe for
//! the main loop and the orchestrator listener task to share one handle
//! without any additional locking, per spec §5.

use crate::api::StoreApi;
use async_trait::async_trait;
use cert_core::{Error, Result};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

/// Handle to the shared Store. Cheap to clone; every clone shares the same
/// underlying connection manager.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connects to the Store, retrying every 2 seconds until a `ping`
    /// succeeds (spec §7: "nothing short of inability to connect to Store
    /// at startup is fatal").
    pub async fn connect_with_retry(url: &str) -> Self {
        loop {
            match Self::connect(url).await {
                Ok(store) => return store,
                Err(e) => {
                    tracing::error!("waiting for store... ({e})");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }

    /// Connects once, without retrying.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Store(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        let store = Self { client, conn };
        store.ping().await?;
        Ok(store)
    }

    /// Opens a dedicated subscription connection (pub/sub requires its own
    /// connection, separate from the pooled `ConnectionManager`) and
    /// returns a stream of raw message payloads on `channel`.
    pub async fn subscribe(&self, channel: &str) -> Result<impl futures::Stream<Item = String> + use<>> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        use futures::StreamExt;
        Ok(pubsub.into_on_message().map(|msg| msg.get_payload::<String>().unwrap_or_default()))
    }
}

#[async_trait]
impl StoreApi for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(key, member).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(key, member).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.sismember(key, member).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.smembers(key).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(key, member, score)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.zrem::<_, _, ()>(key, member).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn zrange(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.zrange(key, 0, -1).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn zrangebyscore_limit(&self, key: &str, max_score: f64, limit: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.zrangebyscore_limit(key, "-inf", max_score, 0, limit)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn hset_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.hget(key, field).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(key, field).await.map_err(|e| Error::Store(e.to_string()))
    }

    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::Store(e.to_string()))?;
            keys.extend(batch);
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        Ok(keys)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }
}
