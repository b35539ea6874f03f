//! Orchestrator Watcher
//!
//! Discovers domains exposed by running workloads: a pure label-parsing
//! layer ([`labels`]) and a Docker Swarm client ([`docker`]) that drives it
//! in snapshot or streaming mode.

pub mod docker;
pub mod labels;

pub use docker::{Discovery, Watcher};
