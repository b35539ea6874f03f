//! Event Bus Producer
//!
//! Thin wrapper over `Store::publish` that serializes a [`cert_core::Event`]
//! to its wire JSON shape before handing it to the single `events/
//! certs_updated` channel, per spec §4.7.

use cert_core::{Event, Result, EVENTS_CHANNEL};
use cert_store::StoreApi;
use std::sync::Arc;

pub struct EventBusProducer {
    store: Arc<dyn StoreApi>,
}

impl EventBusProducer {
    pub fn new(store: Arc<dyn StoreApi>) -> Self {
        Self { store }
    }

    pub async fn publish(&self, event: Event) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        self.store.publish(EVENTS_CHANNEL, &payload).await
    }
}
