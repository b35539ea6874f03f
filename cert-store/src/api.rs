//! The narrow Store interface the rest of the control plane depends on.
//!
//! Mirrors the `ChallengeHandler` trait pattern used for ACME challenge
//! solving: one trait, one production implementation backed by a real
//! service ([`crate::redis_store::RedisStore`]), one in-memory
//! implementation for tests ([`crate::memory::MemoryStore`]).

use async_trait::async_trait;
use cert_core::Result;
use std::collections::HashMap;

/// Everything the Reconciler, Scheduler, Issuer, Event Bus Producer, and
/// Syncer need from the Store. Every method may fail transiently; callers
/// treat errors as soft failures that retry on the next loop tick.
#[async_trait]
pub trait StoreApi: Send + Sync {
    async fn ping(&self) -> Result<()>;

    // Desired set
    async fn sadd(&self, key: &str, member: &str) -> Result<()>;
    async fn srem(&self, key: &str, member: &str) -> Result<()>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    // Schedule (sorted set)
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;
    async fn zrem(&self, key: &str, member: &str) -> Result<()>;
    async fn zrange(&self, key: &str) -> Result<Vec<String>>;
    async fn zrangebyscore_limit(&self, key: &str, max_score: f64, limit: isize) -> Result<Vec<String>>;

    // Hashes (metadata, config, artifacts)
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;
    async fn hset_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;
    async fn hdel(&self, key: &str, field: &str) -> Result<()>;

    // Keys
    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>>;

    // Pub/Sub
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
}
