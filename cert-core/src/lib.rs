//! Cert Controller Core Library
//!
//! Shared types, environment configuration, and error handling for the
//! certificate control plane: domain normalization and wildcard coverage,
//! the event bus payload, the Store key schema, and the JSON shapes stored
//! in the `cert_meta` / `cert_config` hashes.

pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod keys;
pub mod meta;
pub mod time;

pub use error::{Error, Result};
pub use event::{Event, EVENTS_CHANNEL};
pub use time::now_unix;

/// Cert controller version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
