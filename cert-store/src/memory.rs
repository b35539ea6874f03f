//! In-memory Store fake, for tests
//!
//! Mirrors the role `pingclair-tls`'s `MemoryChallengeHandler` plays for
//! `ChallengeHandler`: a simple, non-persistent stand-in for the real
//! backend that lets the pure reconciliation/scheduling logic be tested
//! without a live Redis/Valkey instance.

use crate::api::StoreApi;
use async_trait::async_trait;
use cert_core::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    sets: HashMap<String, HashSet<String>>,
    zsets: HashMap<String, HashMap<String, f64>>,
    hashes: HashMap<String, HashMap<String, String>>,
    published: Vec<(String, String)>,
}

/// A thread-safe, non-persistent `StoreApi` implementation backed by plain
/// `HashMap`s.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(channel, payload)` pair published so far, in order. Used by
    /// tests to assert on event-bus output without a real subscriber.
    pub fn published(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl StoreApi for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        if let Some(set) = self.state.lock().unwrap().sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sets
            .get(key)
            .map(|s| s.contains(member))
            .unwrap_or(false))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .zsets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        if let Some(zset) = self.state.lock().unwrap().zsets.get_mut(key) {
            zset.remove(member);
        }
        Ok(())
    }

    async fn zrange(&self, key: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let Some(zset) = state.zsets.get(key) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<(&String, &f64)> = zset.iter().collect();
        members.sort_by(|a, b| a.1.partial_cmp(b.1).unwrap());
        Ok(members.into_iter().map(|(m, _)| m.clone()).collect())
    }

    async fn zrangebyscore_limit(&self, key: &str, max_score: f64, limit: isize) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let Some(zset) = state.zsets.get(key) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<(&String, &f64)> = zset.iter().filter(|(_, score)| **score <= max_score).collect();
        members.sort_by(|a, b| a.1.partial_cmp(b.1).unwrap());
        let limit = if limit < 0 { members.len() } else { limit as usize };
        Ok(members.into_iter().take(limit).map(|(m, _)| m.clone()).collect())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let hash = state.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .hashes
            .get(key)
            .and_then(|h| h.get(field).cloned()))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self.state.lock().unwrap().hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        if let Some(hash) = self.state.lock().unwrap().hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .state
            .lock()
            .unwrap()
            .hashes
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .published
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}
