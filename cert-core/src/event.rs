//! Event bus payload
//!
//! A single pub/sub channel carries all three event kinds. Delivery is
//! at-most-once; subscribers must tolerate loss (see `cert-syncer`, which
//! compensates with a full scan on every event it does receive).

use serde::{Deserialize, Serialize};

/// The channel all cert events are published on.
pub const EVENTS_CHANNEL: &str = "events/certs_updated";

/// One of the three event kinds the Manager publishes (or the admin API
/// publishes, for `domain_added`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new domain entered the desired set; the Manager should reschedule
    /// it immediately rather than waiting for the next reconcile tick.
    DomainAdded { domain: String },
    /// A certificate was issued or renewed and published to the Store.
    CertUpdated { domain: String },
    /// An operator requested an out-of-band renewal.
    ForceRenew { domain: String },
}

impl Event {
    /// The domain this event concerns, regardless of kind.
    pub fn domain(&self) -> &str {
        match self {
            Event::DomainAdded { domain } => domain,
            Event::CertUpdated { domain } => domain,
            Event::ForceRenew { domain } => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_tagged_json() {
        let event = Event::DomainAdded { domain: "a.example.com".to_string() };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"domain_added","domain":"a.example.com"}"#);
    }

    #[test]
    fn round_trips_all_kinds() {
        for event in [
            Event::DomainAdded { domain: "a".into() },
            Event::CertUpdated { domain: "b".into() },
            Event::ForceRenew { domain: "c".into() },
        ] {
            let json = serde_json::to_string(&event).unwrap();
            let back: Event = serde_json::from_str(&json).unwrap();
            assert_eq!(event, back);
        }
    }

    #[test]
    fn unknown_shape_fails_to_parse() {
        let result: std::result::Result<Event, _> = serde_json::from_str(r#"{"type":"unknown","domain":"x"}"#);
        assert!(result.is_err());
    }
}
