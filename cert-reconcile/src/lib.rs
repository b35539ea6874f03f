//! Reconciler
//!
//! Merges static configuration, Watcher discovery, and the Scheduler's
//! membership into one consistent desired set, per spec §4.4. Runs three
//! passes in order, idempotently: static ingress, dynamic ingress, and
//! schedule alignment.

use cert_core::domain::filter_ingress;
use cert_core::keys::{CERT_CONFIG, CERT_SCHEDULE, TARGET_DOMAINS};
use cert_core::meta::DomainConfig;
use cert_core::{now_unix, Result};
use cert_store::StoreApi;
use cert_watcher::Discovery;
use std::sync::Arc;

/// Runs the three reconciliation passes against a shared Store.
pub struct Reconciler {
    store: Arc<dyn StoreApi>,
    wildcard_roots: Vec<String>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn StoreApi>, wildcard_roots: Vec<String>) -> Self {
        Self { store, wildcard_roots }
    }

    /// Adds each configured wildcard root to the desired set, filtered by
    /// the local-suffix rule.
    pub async fn static_ingress(&self) -> Result<()> {
        for root in &self.wildcard_roots {
            let Some(domain) = filter_ingress(root, std::iter::empty()) else { continue };
            self.store.sadd(TARGET_DOMAINS, &domain).await?;
        }
        Ok(())
    }

    /// Adds every domain found by the Watcher to the desired set, and
    /// records any per-workload challenge override it declared.
    pub async fn dynamic_ingress(&self, discovery: &Discovery) -> Result<()> {
        for domain in &discovery.domains {
            self.store.sadd(TARGET_DOMAINS, domain).await?;
            if let Some(challenge) = discovery.challenge_overrides.get(domain) {
                let config = DomainConfig { challenge: challenge.clone() };
                let value = serde_json::to_string(&config)?;
                self.store.hset(CERT_CONFIG, domain, &value).await?;
            }
        }
        Ok(())
    }

    /// Aligns the Schedule with the Desired set: inserts newly-desired
    /// domains at `now`, and removes schedule entries for domains no
    /// longer desired. Never touches Failure meta or artifacts.
    pub async fn align_schedule(&self) -> Result<()> {
        let desired = self.store.smembers(TARGET_DOMAINS).await?;
        let scheduled = self.store.zrange(CERT_SCHEDULE).await?;

        for domain in &desired {
            if !scheduled.contains(domain) {
                tracing::info!(domain = %domain, "new domain detected, scheduling immediately");
                self.store.zadd(CERT_SCHEDULE, domain, now_unix()).await?;
            }
        }

        for domain in &scheduled {
            if !desired.contains(domain) {
                tracing::info!(domain = %domain, "domain removed from desired set, dropping from schedule");
                self.store.zrem(CERT_SCHEDULE, domain).await?;
            }
        }

        Ok(())
    }

    /// Runs all three passes in order, as the Manager does at startup and
    /// on every reconcile tick.
    pub async fn run(&self, discovery: &Discovery) -> Result<()> {
        self.static_ingress().await?;
        self.dynamic_ingress(discovery).await?;
        self.align_schedule().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cert_store::MemoryStore;

    fn reconciler(wildcard_roots: Vec<&str>) -> (Arc<MemoryStore>, Reconciler) {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(
            store.clone(),
            wildcard_roots.into_iter().map(String::from).collect(),
        );
        (store, reconciler)
    }

    #[tokio::test]
    async fn static_ingress_adds_wildcard_roots() {
        let (store, reconciler) = reconciler(vec!["example.com"]);
        reconciler.static_ingress().await.unwrap();
        let members = store.smembers(TARGET_DOMAINS).await.unwrap();
        assert_eq!(members, vec!["example.com"]);
    }

    #[tokio::test]
    async fn static_ingress_filters_local_suffix() {
        let (store, reconciler) = reconciler(vec!["app.local"]);
        reconciler.static_ingress().await.unwrap();
        assert!(store.smembers(TARGET_DOMAINS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dynamic_ingress_records_challenge_override() {
        let (store, reconciler) = reconciler(vec![]);
        let mut discovery = Discovery::default();
        discovery.domains.push("s.test".to_string());
        discovery.challenge_overrides.insert("s.test".to_string(), "http".to_string());

        reconciler.dynamic_ingress(&discovery).await.unwrap();

        assert_eq!(store.smembers(TARGET_DOMAINS).await.unwrap(), vec!["s.test"]);
        let config_json = store.hget(CERT_CONFIG, "s.test").await.unwrap().unwrap();
        let config: DomainConfig = serde_json::from_str(&config_json).unwrap();
        assert_eq!(config.challenge, "http");
    }

    #[tokio::test]
    async fn schedule_alignment_adds_new_and_removes_stale() {
        let (store, reconciler) = reconciler(vec![]);
        store.sadd(TARGET_DOMAINS, "a.com").await.unwrap();
        store.zadd(CERT_SCHEDULE, "stale.com", 1.0).await.unwrap();

        reconciler.align_schedule().await.unwrap();

        let scheduled = store.zrange(CERT_SCHEDULE).await.unwrap();
        assert_eq!(scheduled, vec!["a.com"]);
    }

    #[tokio::test]
    async fn schedule_invariant_holds_after_alignment() {
        // Property: member(Schedule) ⊆ member(Desired) after alignment.
        let (store, reconciler) = reconciler(vec!["example.com"]);
        store.sadd(TARGET_DOMAINS, "b.example.com").await.unwrap();
        store.zadd(CERT_SCHEDULE, "orphan.com", 1.0).await.unwrap();

        reconciler.run(&Discovery::default()).await.unwrap();

        let desired = store.smembers(TARGET_DOMAINS).await.unwrap();
        let scheduled = store.zrange(CERT_SCHEDULE).await.unwrap();
        for domain in &scheduled {
            assert!(desired.contains(domain), "{domain} in schedule but not desired");
        }
    }

    #[tokio::test]
    async fn reconciling_twice_is_a_no_op() {
        let (store, reconciler) = reconciler(vec!["example.com"]);
        let mut discovery = Discovery::default();
        discovery.domains.push("a.example.com".to_string());

        reconciler.run(&discovery).await.unwrap();
        let first_desired = store.smembers(TARGET_DOMAINS).await.unwrap();
        let first_scheduled = store.zrange(CERT_SCHEDULE).await.unwrap();

        reconciler.run(&discovery).await.unwrap();
        let second_desired = store.smembers(TARGET_DOMAINS).await.unwrap();
        let second_scheduled = store.zrange(CERT_SCHEDULE).await.unwrap();

        let mut a = first_desired.clone();
        let mut b = second_desired.clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);

        let mut a = first_scheduled;
        let mut b = second_scheduled;
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
