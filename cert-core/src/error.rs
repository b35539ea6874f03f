//! Error types for the cert controller

use thiserror::Error;

/// Result type for cert controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type shared across the control plane
#[derive(Error, Debug)]
pub enum Error {
    /// Transient or permanent failure talking to the Store
    #[error("💾 Store error: {0}")]
    Store(String),

    /// Configuration error (missing/invalid environment option)
    #[error("⚙️ Configuration error: {0}")]
    Config(String),

    /// ACME driver failure
    #[error("🔐 ACME error: {0}")]
    Acme(String),

    /// Orchestrator watcher failure
    #[error("👁️ Watcher error: {0}")]
    Watcher(String),

    /// IO error
    #[error("💥 IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("📄 JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
