//! ACME Driver
//!
//! Wraps invocation of an external ACME client tool (shaped like `lego`'s
//! CLI) as a subprocess, and reads the certificate/key files it leaves
//! behind. This crate never speaks the ACME protocol itself — it trusts
//! the external tool to do that, and only parses the resulting
//! certificate's `NotAfter` field to decide the next scheduling point.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

/// Errors the ACME Driver can surface. A non-zero tool exit is represented
/// by [`IssueOutcome::Failure`], not by this error type — only conditions
/// that prevent the driver from even attempting issuance end up here.
#[derive(Debug, Error)]
pub enum AcmeError {
    #[error("⚠️ Failed to spawn acme tool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("🔍 Failed to read certificate file {path:?}: {source}")]
    ReadCertificate { path: PathBuf, source: std::io::Error },

    #[error("🔑 Failed to read key file {path:?}: {source}")]
    ReadKey { path: PathBuf, source: std::io::Error },
}

/// Challenge mechanism used for a given issuance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeType {
    Http,
    Dns,
}

impl ChallengeType {
    pub fn from_str_default(raw: &str) -> Self {
        match raw {
            "http" => ChallengeType::Http,
            _ => ChallengeType::Dns,
        }
    }
}

/// All inputs the driver needs for one issuance attempt.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub domain: String,
    /// `Some("*.<domain>")`-style sibling when `domain` is a wildcard root.
    pub wildcard_sibling: Option<String>,
    pub challenge: ChallengeType,
    pub email: String,
    pub dns_provider: String,
    pub directory_url: String,
    /// Shell-quoted extra arguments, split with the same rules as the
    /// original's `shlex.split`.
    pub extra_args: String,
    pub certs_dir: PathBuf,
    /// Local listener port used for the HTTP-01 challenge.
    pub http_port: u16,
}

/// The fully read certificate/key pair for a domain.
#[derive(Debug, Clone)]
pub struct CertificateFiles {
    pub domain: String,
    pub crt_pem: String,
    pub key_pem: String,
}

/// Outcome of one issuance attempt.
#[derive(Debug, Clone)]
pub enum IssueOutcome {
    Success {
        files: CertificateFiles,
        /// Expiry parsed from the certificate's `NotAfter` field, if the
        /// certificate could be parsed.
        expiry_unix: Option<i64>,
    },
    Failure {
        /// Combined stderr output, used both for logging and rate-limit
        /// detection.
        stderr: String,
    },
}

/// Wraps invocation of the external ACME tool.
pub struct AcmeDriver {
    /// Path or name of the tool binary (e.g. `"lego"`).
    tool_path: String,
}

impl AcmeDriver {
    pub fn new(tool_path: impl Into<String>) -> Self {
        Self { tool_path: tool_path.into() }
    }

    fn cert_path(certs_dir: &Path, domain: &str) -> PathBuf {
        certs_dir.join("certificates").join(format!("{domain}.crt"))
    }

    fn key_path(certs_dir: &Path, domain: &str) -> PathBuf {
        certs_dir.join("certificates").join(format!("{domain}.key"))
    }

    /// Builds the argument list for one invocation, including mode
    /// selection (`run` vs `renew`), per spec §4.2.
    fn build_args(req: &IssueRequest, is_renewal: bool) -> Vec<String> {
        let mut args = vec![
            "--email".to_string(),
            req.email.clone(),
            "--domains".to_string(),
            req.domain.clone(),
        ];

        if let Some(sibling) = &req.wildcard_sibling {
            args.push("--domains".to_string());
            args.push(sibling.clone());
        }

        args.push("--path".to_string());
        args.push(req.certs_dir.to_string_lossy().into_owned());
        args.push("--server".to_string());
        args.push(req.directory_url.clone());
        args.push("--accept-tos".to_string());

        if !req.extra_args.is_empty() {
            if let Ok(extra) = shell_words::split(&req.extra_args) {
                args.extend(extra);
            }
        }

        match req.challenge {
            ChallengeType::Http => {
                args.push("--http".to_string());
                args.push("--http.port".to_string());
                args.push(format!(":{}", req.http_port));
            }
            ChallengeType::Dns => {
                args.push("--dns".to_string());
                args.push(req.dns_provider.clone());
            }
        }

        if is_renewal {
            args.push("renew".to_string());
            args.push("--days".to_string());
            args.push("60".to_string());
            args.push("--reuse-key".to_string());
        } else {
            args.push("run".to_string());
        }

        args
    }

    /// Runs one issuance attempt. Mode is selected by whether a
    /// certificate already exists on disk for `req.domain` (renew with a
    /// 60-day window and key reuse; otherwise a fresh `run`).
    pub async fn invoke(&self, req: &IssueRequest) -> Result<IssueOutcome, AcmeError> {
        let cert_path = Self::cert_path(&req.certs_dir, &req.domain);
        let is_renewal = cert_path.exists();
        let args = Self::build_args(req, is_renewal);

        tracing::info!(domain = %req.domain, renewal = is_renewal, "invoking acme tool");

        let output = tokio::process::Command::new(&self.tool_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(domain = %req.domain, "acme tool failed: {stderr}");
            return Ok(IssueOutcome::Failure { stderr });
        }

        let files = read_certificate_files(&req.certs_dir, &req.domain)?;
        let expiry_unix = parse_expiry_unix(&files.crt_pem);

        Ok(IssueOutcome::Success { files, expiry_unix })
    }
}

/// Reads `<certs_dir>/certificates/<domain>.{crt,key}` into memory.
pub fn read_certificate_files(certs_dir: &Path, domain: &str) -> Result<CertificateFiles, AcmeError> {
    let crt_path = AcmeDriver::cert_path(certs_dir, domain);
    let key_path = AcmeDriver::key_path(certs_dir, domain);

    let crt_pem = std::fs::read_to_string(&crt_path)
        .map_err(|source| AcmeError::ReadCertificate { path: crt_path, source })?;
    let key_pem = std::fs::read_to_string(&key_path)
        .map_err(|source| AcmeError::ReadKey { path: key_path, source })?;

    Ok(CertificateFiles { domain: domain.to_string(), crt_pem, key_pem })
}

/// Returns whether a certificate file already exists for `domain`, i.e.
/// whether the next invocation should run in renew mode.
pub fn certificate_exists(certs_dir: &Path, domain: &str) -> bool {
    AcmeDriver::cert_path(certs_dir, domain).exists()
}

/// Parses the `NotAfter` field of a PEM certificate and returns it as a
/// Unix timestamp. Returns `None` if the PEM can't be parsed — callers
/// treat this as the "malformed / missing certificate" case from spec §7
/// and fall back to a short defensive retry.
pub fn parse_expiry_unix(crt_pem: &str) -> Option<i64> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(crt_pem.as_bytes()).ok()?;
    let cert = pem.parse_x509().ok()?;
    Some(cert.validity().not_after.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(certs_dir: PathBuf) -> IssueRequest {
        IssueRequest {
            domain: "a.example.com".to_string(),
            wildcard_sibling: None,
            challenge: ChallengeType::Dns,
            email: "ops@example.com".to_string(),
            dns_provider: "manual".to_string(),
            directory_url: "https://acme-v02.api.letsencrypt.org/directory".to_string(),
            extra_args: String::new(),
            certs_dir,
            http_port: 8080,
        }
    }

    #[test]
    fn run_mode_for_new_domain() {
        let req = base_request(PathBuf::from("/certs"));
        let args = AcmeDriver::build_args(&req, false);
        assert!(args.contains(&"run".to_string()));
        assert!(!args.contains(&"renew".to_string()));
        assert!(args.contains(&"--dns".to_string()));
        assert!(args.contains(&"manual".to_string()));
    }

    #[test]
    fn renew_mode_sets_window_and_key_reuse() {
        let req = base_request(PathBuf::from("/certs"));
        let args = AcmeDriver::build_args(&req, true);
        assert!(args.contains(&"renew".to_string()));
        assert!(args.contains(&"--days".to_string()));
        assert!(args.contains(&"60".to_string()));
        assert!(args.contains(&"--reuse-key".to_string()));
    }

    #[test]
    fn http_challenge_adds_port_flag() {
        let mut req = base_request(PathBuf::from("/certs"));
        req.challenge = ChallengeType::Http;
        let args = AcmeDriver::build_args(&req, false);
        assert!(args.contains(&"--http".to_string()));
        assert!(args.contains(&":8080".to_string()));
    }

    #[test]
    fn wildcard_sibling_is_a_second_domains_flag() {
        let mut req = base_request(PathBuf::from("/certs"));
        req.wildcard_sibling = Some("*.example.com".to_string());
        let args = AcmeDriver::build_args(&req, false);
        let domains_count = args.iter().filter(|a| *a == "--domains").count();
        assert_eq!(domains_count, 2);
        assert!(args.contains(&"*.example.com".to_string()));
    }

    #[test]
    fn extra_args_are_shell_split() {
        let mut req = base_request(PathBuf::from("/certs"));
        req.extra_args = "--dns.resolvers 1.1.1.1 --pem".to_string();
        let args = AcmeDriver::build_args(&req, false);
        assert!(args.contains(&"--dns.resolvers".to_string()));
        assert!(args.contains(&"1.1.1.1".to_string()));
        assert!(args.contains(&"--pem".to_string()));
    }

    #[test]
    fn certificate_exists_reflects_disk_state() {
        let dir = tempfile::tempdir().unwrap();
        let certs_dir = dir.path().join("certificates");
        std::fs::create_dir_all(&certs_dir).unwrap();
        assert!(!certificate_exists(dir.path(), "a.example.com"));

        std::fs::write(certs_dir.join("a.example.com.crt"), "PEM").unwrap();
        assert!(certificate_exists(dir.path(), "a.example.com"));
    }

    #[test]
    fn malformed_pem_yields_no_expiry() {
        assert_eq!(parse_expiry_unix("not a certificate"), None);
    }
}
