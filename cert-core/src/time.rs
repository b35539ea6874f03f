//! Wall-clock helpers
//!
//! Centralised so every crate that schedules work (Reconciler, Scheduler,
//! Issuer) agrees on one definition of "now".

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix seconds (fractional), matching the score type used
/// in the `cert_schedule` sorted set.
pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
