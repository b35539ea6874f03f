//! Failure back-off policy
//!
//! Exponential back-off from 5 minutes up to a 24-hour ceiling, with a
//! 1-hour floor enforced whenever the ACME tool's output looks like a
//! rate-limit response. See spec §4.5 step 4 and §8 property 3.

const BASE_SECONDS: u64 = 300;
const CEILING_SECONDS: u64 = 86_400;
const RATE_LIMIT_FLOOR_SECONDS: u64 = 3_600;

/// Returns `true` if `output` looks like a rate-limit response from the
/// ACME tool (a literal `"429"`, or `"rate limit"` case-insensitively).
pub fn looks_rate_limited(output: &str) -> bool {
    output.contains("429") || output.to_lowercase().contains("rate limit")
}

/// Computes the back-off delay, in seconds, for the `failures`-th
/// consecutive failure (1-indexed). Applies the rate-limit floor when
/// `rate_limited` is set.
pub fn backoff_seconds(failures: u32, rate_limited: bool) -> u64 {
    let exponential = BASE_SECONDS.saturating_mul(1u64 << failures.saturating_sub(1).min(63));
    let mut delay = exponential.min(CEILING_SECONDS);
    if rate_limited {
        delay = delay.max(RATE_LIMIT_FLOOR_SECONDS);
    }
    delay
}
