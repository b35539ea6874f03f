//! Pure label → domain extraction
//!
//! Kept free of any Docker client dependency so the rule-parsing contract
//! can be tested in isolation, per spec §9's REDESIGN FLAGS item. The
//! regex contract:
//!
//! ```text
//! Host\([`'"]([^`'"]+)[`'"](?:,\s*[`'"]([^`'"]+)[`'"])*\)
//! ```
//!
//! matches one or more comma-separated, quoted hostnames inside a single
//! `Host(...)` call.

use std::collections::HashMap;
use std::sync::LazyLock;

static ROUTER_RULE_KEY: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"traefik\.http\.routers\.[^.]+\.rule").unwrap());

static HOST_CALL: LazyLock<regex::Regex> = LazyLock::new(|| regex::Regex::new(r#"Host\(([^)]*)\)"#).unwrap());

static QUOTED_ARG: LazyLock<regex::Regex> = LazyLock::new(|| regex::Regex::new(r#"[`'"]([^`'"]+)[`'"]"#).unwrap());

/// Extracts every quoted hostname from the argument list of every
/// `Host(...)` call in `rule`.
///
/// `Host(\`a.com\`, 'b.com')` yields `["a.com", "b.com"]`.
pub fn extract_hosts_from_rule(rule: &str) -> Vec<String> {
    let mut domains = Vec::new();
    for call in HOST_CALL.captures_iter(rule) {
        let args = call.get(1).map(|m| m.as_str()).unwrap_or("");
        for quoted in QUOTED_ARG.captures_iter(args) {
            if let Some(domain) = quoted.get(1) {
                domains.push(domain.as_str().to_string());
            }
        }
    }
    domains
}

/// Given a workload's label map, returns every domain named by a
/// `traefik.http.routers.<name>.rule` label whose value contains `Host(...)`.
pub fn extract_domains_from_labels(labels: &HashMap<String, String>) -> Vec<String> {
    let mut domains = Vec::new();
    for (key, value) in labels {
        if ROUTER_RULE_KEY.is_match(key) {
            domains.extend(extract_hosts_from_rule(value));
        }
    }
    domains
}

/// The per-workload challenge override label, if set.
pub const CHALLENGE_OVERRIDE_LABEL: &str = "cert-manager.challenge";

/// Returns the challenge override declared by a workload's labels, if any.
pub fn extract_challenge_override(labels: &HashMap<String, String>) -> Option<String> {
    labels.get(CHALLENGE_OVERRIDE_LABEL).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn extracts_single_backtick_host() {
        let domains = extract_hosts_from_rule("Host(`api.example.com`)");
        assert_eq!(domains, vec!["api.example.com"]);
    }

    #[test]
    fn extracts_multiple_comma_separated_hosts() {
        let domains = extract_hosts_from_rule("Host(`a.example.com`, `b.example.com`)");
        assert_eq!(domains, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn accepts_mixed_quote_styles() {
        let domains = extract_hosts_from_rule(r#"Host(`a.com`, 'b.com', "c.com")"#);
        assert_eq!(domains, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn ignores_unrelated_label_values() {
        let domains = extract_hosts_from_rule("PathPrefix(`/api`)");
        assert!(domains.is_empty());
    }

    #[test]
    fn extracts_from_full_label_map() {
        let labels = labels(&[
            ("traefik.http.routers.web.rule", "Host(`s.test`)"),
            ("traefik.enable", "true"),
        ]);
        assert_eq!(extract_domains_from_labels(&labels), vec!["s.test"]);
    }

    #[test]
    fn extracts_challenge_override() {
        let labels = labels(&[("cert-manager.challenge", "http")]);
        assert_eq!(extract_challenge_override(&labels), Some("http".to_string()));
        assert_eq!(extract_challenge_override(&HashMap::new()), None);
    }
}
