//! Docker Swarm orchestrator client
//!
//! Two operation modes per spec §4.3: a snapshot scan (startup + 60s
//! fallback) and a long-lived event stream that triggers an immediate
//! snapshot on `create`/`update` service events. If the Docker client
//! fails to initialize, the watcher degrades gracefully: discovery is
//! disabled but the rest of the control plane keeps working on static
//! configuration alone.

use crate::labels::{extract_challenge_override, extract_domains_from_labels};
use bollard::service::ListServicesOptions;
use bollard::system::{EventMessage, EventsOptions};
use cert_core::domain::filter_ingress;
use futures::{Stream, StreamExt};
use std::collections::HashMap;

/// The set of domains and per-domain challenge overrides found in one
/// snapshot pass, already filtered by the local-suffix and wildcard-
/// coverage rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub domains: Vec<String>,
    pub challenge_overrides: HashMap<String, String>,
}

/// Connects to the Docker daemon and exposes snapshot/stream discovery.
#[derive(Clone)]
pub struct Watcher {
    docker: Option<bollard::Docker>,
}

impl Watcher {
    /// Attempts to connect using the local Docker defaults. On failure,
    /// returns a watcher with discovery disabled rather than propagating
    /// the error — per spec §4.3 and §7.
    pub fn connect() -> Self {
        match bollard::Docker::connect_with_local_defaults() {
            Ok(docker) => Self { docker: Some(docker) },
            Err(e) => {
                tracing::warn!("docker client unavailable, discovery disabled: {e}");
                Self { docker: None }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.docker.is_some()
    }

    /// Enumerates every Swarm service, extracts Traefik router rule hosts
    /// from labels, and applies the local-suffix + wildcard-coverage
    /// filter before returning the discovered set.
    pub async fn snapshot(&self, wildcard_roots: &[String]) -> cert_core::Result<Discovery> {
        let Some(docker) = &self.docker else {
            return Ok(Discovery::default());
        };

        let options: ListServicesOptions<String> = ListServicesOptions::default();
        let services = docker
            .list_services(Some(options))
            .await
            .map_err(|e| cert_core::Error::Watcher(e.to_string()))?;

        let mut discovery = Discovery::default();
        let roots: Vec<&str> = wildcard_roots.iter().map(String::as_str).collect();

        for service in services {
            let Some(spec) = service.spec else { continue };
            let Some(labels) = spec.labels else { continue };

            let override_challenge = extract_challenge_override(&labels);
            for raw in extract_domains_from_labels(&labels) {
                let Some(domain) = filter_ingress(&raw, roots.iter().copied()) else { continue };
                if let Some(challenge) = &override_challenge {
                    discovery
                        .challenge_overrides
                        .insert(domain.clone(), challenge.clone());
                }
                if !discovery.domains.contains(&domain) {
                    discovery.domains.push(domain);
                }
            }
        }

        Ok(discovery)
    }

    /// Subscribes to Docker service `create`/`update` events. Each item in
    /// the returned stream is a signal to run an immediate snapshot; the
    /// stream is empty if discovery is disabled.
    pub fn service_change_events(&self) -> impl Stream<Item = ()> + use<> {
        let docker = self.docker.clone();

        futures::stream::once(async move { docker })
            .filter_map(|docker| async move { docker })
            .flat_map(|docker| {
                let mut filters = HashMap::new();
                filters.insert("type".to_string(), vec!["service".to_string()]);
                let options = EventsOptions::<String> {
                    since: None,
                    until: None,
                    filters,
                };
                docker.events(Some(options))
            })
            .filter_map(|event| async move {
                match event {
                    Ok(EventMessage { action: Some(action), .. }) if action == "create" || action == "update" => {
                        Some(())
                    }
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!("docker event stream error: {e}");
                        None
                    }
                }
            })
    }
}
