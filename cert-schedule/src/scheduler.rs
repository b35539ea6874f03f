//! Scheduler
//!
//! A thin wrapper over the `cert_schedule` ZSET exposing exactly the one
//! operation spec §4.5 grants the main loop: peek the single most-overdue
//! domain without removing it. Reinsertion with a new timestamp, via
//! [`Scheduler::reschedule`], is the only legal way to advance a domain
//! past the current due point.

use cert_core::keys::CERT_SCHEDULE;
use cert_core::Result;
use cert_store::StoreApi;
use std::sync::Arc;

pub struct Scheduler {
    store: Arc<dyn StoreApi>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn StoreApi>) -> Self {
        Self { store }
    }

    /// Returns the single domain most overdue at `now`, if any, without
    /// removing it from the schedule.
    pub async fn pop_one_due(&self, now: f64) -> Result<Option<String>> {
        let due = self.store.zrangebyscore_limit(CERT_SCHEDULE, now, 1).await?;
        Ok(due.into_iter().next())
    }

    /// Reschedules `domain` to `at`. The only sanctioned way to move a
    /// domain past its current due point.
    pub async fn reschedule(&self, domain: &str, at: f64) -> Result<()> {
        self.store.zadd(CERT_SCHEDULE, domain, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cert_store::MemoryStore;

    #[tokio::test]
    async fn pop_one_due_returns_only_the_most_overdue() {
        let store = Arc::new(MemoryStore::new());
        store.zadd(CERT_SCHEDULE, "later.com", 200.0).await.unwrap();
        store.zadd(CERT_SCHEDULE, "due.com", 50.0).await.unwrap();
        let scheduler = Scheduler::new(store.clone());

        let due = scheduler.pop_one_due(100.0).await.unwrap();
        assert_eq!(due.as_deref(), Some("due.com"));
    }

    #[tokio::test]
    async fn pop_does_not_remove_the_entry() {
        let store = Arc::new(MemoryStore::new());
        store.zadd(CERT_SCHEDULE, "due.com", 50.0).await.unwrap();
        let scheduler = Scheduler::new(store.clone());

        scheduler.pop_one_due(100.0).await.unwrap();
        let scheduled = store.zrange(CERT_SCHEDULE).await.unwrap();
        assert_eq!(scheduled, vec!["due.com"]);
    }

    #[tokio::test]
    async fn nothing_due_yields_none() {
        let store = Arc::new(MemoryStore::new());
        store.zadd(CERT_SCHEDULE, "future.com", 500.0).await.unwrap();
        let scheduler = Scheduler::new(store.clone());

        assert_eq!(scheduler.pop_one_due(100.0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reschedule_moves_the_domain_past_due() {
        let store = Arc::new(MemoryStore::new());
        store.zadd(CERT_SCHEDULE, "due.com", 50.0).await.unwrap();
        let scheduler = Scheduler::new(store.clone());

        scheduler.reschedule("due.com", 1_000.0).await.unwrap();
        assert_eq!(scheduler.pop_one_due(100.0).await.unwrap(), None);
    }
}
