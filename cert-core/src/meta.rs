//! JSON value shapes stored in the `cert_meta` and `cert_config` hashes.

use serde::{Deserialize, Serialize};

/// Back-off state for a domain, stored as the value of one `cert_meta`
/// hash field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMeta {
    pub failures: u32,
    #[serde(default)]
    pub last_error: String,
}

/// Maximum number of trailing characters of ACME tool output retained in
/// `last_error`.
pub const LAST_ERROR_TAIL_LEN: usize = 200;

impl FailureMeta {
    /// Builds the next failure record given the previous one (or `None` on
    /// first failure) and the tool's combined output.
    ///
    /// Takes the last [`LAST_ERROR_TAIL_LEN`] *characters*, not bytes —
    /// `output` comes from a lossy UTF-8 conversion of subprocess stderr
    /// and a byte-offset slice can land mid-codepoint and panic.
    pub fn next(previous: Option<FailureMeta>, output: &str) -> Self {
        let failures = previous.map(|m| m.failures).unwrap_or(0) + 1;
        let tail: String = {
            let mut chars: Vec<char> = output.chars().rev().take(LAST_ERROR_TAIL_LEN).collect();
            chars.reverse();
            chars.into_iter().collect()
        };
        Self { failures, last_error: tail }
    }
}

/// Per-domain challenge override, stored as the value of one `cert_config`
/// hash field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub challenge: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_starts_at_one() {
        let meta = FailureMeta::next(None, "boom");
        assert_eq!(meta.failures, 1);
        assert_eq!(meta.last_error, "boom");
    }

    #[test]
    fn failures_increment_from_previous() {
        let first = FailureMeta::next(None, "boom");
        let second = FailureMeta::next(Some(first), "boom again");
        assert_eq!(second.failures, 2);
    }

    #[test]
    fn last_error_is_truncated_to_tail() {
        let long_output = "x".repeat(500) + "END";
        let meta = FailureMeta::next(None, &long_output);
        assert_eq!(meta.last_error.len(), LAST_ERROR_TAIL_LEN);
        assert!(meta.last_error.ends_with("END"));
    }

    #[test]
    fn multi_byte_output_does_not_panic_on_truncation() {
        // "é" is 2 bytes; a byte-offset slice at exactly LAST_ERROR_TAIL_LEN
        // bytes from the end would land mid-codepoint here and panic.
        let long_output = "é".repeat(300) + "END";
        let meta = FailureMeta::next(None, &long_output);
        assert_eq!(meta.last_error.chars().count(), LAST_ERROR_TAIL_LEN);
        assert!(meta.last_error.ends_with("END"));
    }
}
