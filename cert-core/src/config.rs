//! Environment-driven configuration
//!
//! Every recognised option is read from an environment variable. Before any
//! option is read, [`load_file_secrets`] scans the environment for
//! `<NAME>_FILE` variables and, if the path they name exists and is
//! readable, exports the file's stripped content under `<NAME>` (dropping
//! the `_FILE` suffix). This mirrors the original system's `load_secrets()`
//! step and lets the same config surface be driven by Docker/Kubernetes
//! secret files without any special-casing downstream.

use crate::error::{Error, Result};

/// For every `X_FILE` environment variable pointing at a readable file,
/// exports the file's stripped contents under `X`.
///
/// Must run once, before any other config is read. Safe to call more than
/// once (idempotent: re-reading the same file re-exports the same value).
pub fn load_file_secrets() {
    let overrides: Vec<(String, String)> = std::env::vars()
        .filter_map(|(key, path)| {
            let target = key.strip_suffix("_FILE")?.to_string();
            if !std::path::Path::new(&path).is_file() {
                return None;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => Some((target, content.trim().to_string())),
                Err(e) => {
                    tracing::warn!("failed to load secret from {} ({}): {}", key, path, e);
                    None
                }
            }
        })
        .collect();

    for (key, value) in overrides {
        // SAFETY: single-threaded startup path, before any other thread
        // reads the process environment.
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Store (Redis/Valkey) connection parameters.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let port = env_or("VALKEY_PORT", "6379")
            .parse()
            .map_err(|e| Error::Config(format!("invalid VALKEY_PORT: {e}")))?;
        let password = std::env::var("VALKEY_PASSWORD").ok().filter(|p| !p.is_empty());
        Ok(Self {
            host: env_or("VALKEY_HOST", "valkey"),
            port,
            password,
        })
    }

    /// Connection URL in the form `redis://[:password@]host:port`.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{password}@{}:{}", self.host, self.port),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }
}

/// ACME issuance parameters, static per-process (per-domain overrides live
/// in the Store's `cert_config` hash, not here).
#[derive(Debug, Clone)]
pub struct AcmeConfig {
    pub email: String,
    pub default_challenge: String,
    pub http_domains: Vec<String>,
    pub dns_provider: String,
    pub directory_url: String,
    pub extra_args: String,
    pub certs_dir: std::path::PathBuf,
}

impl AcmeConfig {
    pub fn from_env() -> Self {
        Self {
            email: env_or("ACME_EMAIL", ""),
            default_challenge: env_or("ACME_CHALLENGE_TYPE", "dns"),
            http_domains: csv(&env_or("ACME_HTTP_DOMAINS", "")),
            dns_provider: env_or("LEGO_DNS_PROVIDER", "manual"),
            directory_url: env_or("LEGO_SERVER", "https://acme-v02.api.letsencrypt.org/directory"),
            extra_args: env_or("LEGO_EXTRA_ARGS", ""),
            certs_dir: std::path::PathBuf::from(env_or("CERTS_DIR", "/certs")),
        }
    }
}

/// Static domain ingress parameters.
#[derive(Debug, Clone)]
pub struct StaticDomainsConfig {
    pub wildcard_roots: Vec<String>,
}

impl StaticDomainsConfig {
    pub fn from_env() -> Self {
        Self {
            wildcard_roots: csv(&env_or("DOMAINS_WILDCARD", "")),
        }
    }
}

/// Syncer-specific parameters.
#[derive(Debug, Clone)]
pub struct SyncerConfig {
    pub certs_dir: std::path::PathBuf,
    pub manifest_path: std::path::PathBuf,
}

impl SyncerConfig {
    pub fn from_env() -> Self {
        let certs_dir = std::path::PathBuf::from(env_or("CERTS_DIR", "/certs")).join("certificates");
        Self {
            manifest_path: std::path::PathBuf::from(env_or(
                "TRAEFIK_DYNAMIC_CONFIG_FILE",
                "/certs/certificates.yml",
            )),
            certs_dir,
        }
    }
}
