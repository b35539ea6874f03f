//! Scheduler, Issuer, and Event Bus Producer
//!
//! Implements spec §4.5's main-loop action: pick the one most-overdue
//! domain, attempt issuance, and apply the resulting success/failure
//! transition to the Schedule and Store.

pub mod backoff;
pub mod event_bus;
pub mod issuer;
pub mod scheduler;

pub use event_bus::EventBusProducer;
pub use issuer::{Issuer, IssuerConfig};
pub use scheduler::Scheduler;
