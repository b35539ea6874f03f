//! Store key schema
//!
//! Centralises the literal key names every crate that talks to the Store
//! must agree on, per spec §6.

/// Desired domains, `SET`.
pub const TARGET_DOMAINS: &str = "target_domains";
/// Next-action schedule, `ZSET` (score = unix seconds).
pub const CERT_SCHEDULE: &str = "cert_schedule";
/// Per-domain failure/back-off state, `HASH` of JSON values.
pub const CERT_META: &str = "cert_meta";
/// Per-domain config overrides, `HASH` of JSON values.
pub const CERT_CONFIG: &str = "cert_config";

/// Returns the artifact hash key for `domain`, e.g. `cert_data:a.example.com`.
pub fn cert_data_key(domain: &str) -> String {
    format!("cert_data:{domain}")
}

/// Glob pattern used to `SCAN` all artifact keys.
pub const CERT_DATA_SCAN_PATTERN: &str = "cert_data:*";

/// Strips the `cert_data:` prefix from a scanned key, returning the domain.
pub fn domain_from_cert_data_key(key: &str) -> Option<&str> {
    key.strip_prefix("cert_data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_artifact_key() {
        let key = cert_data_key("a.example.com");
        assert_eq!(key, "cert_data:a.example.com");
        assert_eq!(domain_from_cert_data_key(&key), Some("a.example.com"));
    }
}
