//! Dynamic TLS manifest
//!
//! Builds the YAML document the proxy's dynamic file provider watches,
//! shaped `{tls: {certificates: [{certFile, keyFile}, ...]}}` — resolved
//! from the original system's `yaml.dump` call (spec §4.6, SPEC_FULL §4.6).

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CertificateEntry {
    #[serde(rename = "certFile")]
    pub cert_file: String,
    #[serde(rename = "keyFile")]
    pub key_file: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct TlsSection {
    certificates: Vec<CertificateEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Manifest {
    tls: TlsSection,
}

/// Enumerates every `<domain>.crt` in `certs_dir` that has a sibling
/// `<domain>.key`, sorted by domain name for a deterministic manifest.
pub fn discover_certificate_pairs(certs_dir: &Path) -> std::io::Result<Vec<CertificateEntry>> {
    let mut domains = Vec::new();

    let entries = match std::fs::read_dir(certs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let path = entry?.path();
        let Some(domain) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        if path.extension().and_then(|e| e.to_str()) != Some("crt") {
            continue;
        }
        let key_path = path.with_extension("key");
        if !key_path.is_file() {
            continue;
        }
        domains.push(domain.to_string());
    }

    domains.sort();
    Ok(domains
        .into_iter()
        .map(|domain| CertificateEntry {
            cert_file: certs_dir.join(format!("{domain}.crt")).to_string_lossy().into_owned(),
            key_file: certs_dir.join(format!("{domain}.key")).to_string_lossy().into_owned(),
        })
        .collect())
}

pub fn render(certificates: Vec<CertificateEntry>) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&Manifest { tls: TlsSection { certificates } })
}

/// Installs `content` at `destination` via write-temp-then-rename, so the
/// proxy watching `destination` never observes a partially-written file.
pub fn install_atomically(destination: &Path, content: &str) -> std::io::Result<()> {
    let parent = destination.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp_path = PathBuf::from(parent);
    let tmp_name = format!(".{}.tmp", destination.file_name().and_then(|n| n.to_str()).unwrap_or("manifest"));
    tmp_path.push(tmp_name);

    let mut tmp_file = std::fs::File::create(&tmp_path)?;
    tmp_file.write_all(content.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, destination)
}
