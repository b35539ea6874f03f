//! cert-manager — the single-writer control loop
//!
//! Wires the Store Adapter, ACME Driver, Orchestrator Watcher, Reconciler,
//! Scheduler, Issuer, and Event Bus Producer together into the main loop
//! described in spec §4.5: reconcile on startup and every 60 seconds (or
//! immediately on an orchestrator event), process at most one inbound
//! Store event per iteration, and attempt at most one issuance per
//! iteration.

use cert_acme::AcmeDriver;
use cert_core::config::{AcmeConfig, StaticDomainsConfig, StoreConfig};
use cert_core::{now_unix, Event};
use cert_reconcile::Reconciler;
use cert_schedule::{Issuer, IssuerConfig, Scheduler};
use cert_store::{RedisStore, StoreApi};
use cert_watcher::Watcher;
use clap::Parser;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default listener port for the HTTP-01 challenge.
const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default external ACME client binary, shaped like `lego`'s CLI.
const DEFAULT_ACME_TOOL: &str = "lego";
/// Reconcile cadence independent of orchestrator event arrival.
const RECONCILE_PERIOD: Duration = Duration::from_secs(60);
/// Event-receive poll timeout for the main loop.
const EVENT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "cert-manager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cert_core::config::load_file_secrets();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.verbose {
        tracing::info!("verbose mode enabled");
    }

    let store_config = StoreConfig::from_env()?;
    let acme_config = AcmeConfig::from_env();
    let static_config = StaticDomainsConfig::from_env();

    tracing::info!("waiting for store at {}:{}", store_config.host, store_config.port);
    let redis_store = RedisStore::connect_with_retry(&store_config.url()).await;
    tracing::info!("store connection established");

    let store: Arc<dyn StoreApi> = Arc::new(redis_store.clone());
    let watcher = Watcher::connect();
    if !watcher.is_enabled() {
        tracing::warn!("orchestrator discovery disabled; relying on static configuration only");
    }

    let reconciler = Reconciler::new(store.clone(), static_config.wildcard_roots.clone());
    let scheduler = Scheduler::new(store.clone());
    let issuer = Issuer::new(
        store.clone(),
        AcmeDriver::new(DEFAULT_ACME_TOOL),
        IssuerConfig {
            email: acme_config.email.clone(),
            default_challenge: cert_acme::ChallengeType::from_str_default(&acme_config.default_challenge),
            http_domains: acme_config.http_domains.clone(),
            wildcard_roots: static_config.wildcard_roots.clone(),
            dns_provider: acme_config.dns_provider.clone(),
            directory_url: acme_config.directory_url.clone(),
            extra_args: acme_config.extra_args.clone(),
            certs_dir: acme_config.certs_dir.clone(),
            http_port: DEFAULT_HTTP_PORT,
        },
    );

    reconcile_now(&reconciler, &watcher, &static_config.wildcard_roots).await;

    let (docker_tx, mut docker_rx) = tokio::sync::mpsc::channel::<()>(1);
    {
        let watcher = watcher.clone();
        tokio::spawn(async move {
            let mut events = Box::pin(watcher.service_change_events());
            while events.next().await.is_some() {
                // A full channel means a reconcile is already pending; dropping
                // this signal is fine, the pending one will cover it.
                let _ = docker_tx.try_send(());
            }
        });
    }

    let mut store_events = Box::pin(redis_store.subscribe(cert_core::EVENTS_CHANNEL).await?);
    let mut reconcile_ticker = tokio::time::interval(RECONCILE_PERIOD);
    reconcile_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!("control loop starting");
    loop {
        tokio::select! {
            payload = store_events.next() => {
                if let Some(payload) = payload {
                    handle_event(&scheduler, &payload).await;
                }
            }
            _ = docker_rx.recv() => {
                reconcile_now(&reconciler, &watcher, &static_config.wildcard_roots).await;
            }
            _ = reconcile_ticker.tick() => {
                reconcile_now(&reconciler, &watcher, &static_config.wildcard_roots).await;
            }
            _ = tokio::time::sleep(EVENT_POLL_TIMEOUT) => {}
        }

        maybe_issue(&scheduler, &issuer).await;
    }
}

async fn reconcile_now(reconciler: &Reconciler, watcher: &Watcher, wildcard_roots: &[String]) {
    let discovery = match watcher.snapshot(wildcard_roots).await {
        Ok(discovery) => discovery,
        Err(e) => {
            tracing::warn!("orchestrator snapshot failed, reconciling on static config only: {e}");
            cert_watcher::Discovery::default()
        }
    };

    if let Err(e) = reconciler.run(&discovery).await {
        tracing::warn!("reconcile pass failed: {e}");
    }
}

/// Processes exactly one inbound event per call, per spec §4.5. Unknown
/// shapes are logged and dropped rather than treated as fatal.
async fn handle_event(scheduler: &Scheduler, payload: &str) {
    let event: Event = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("dropping unparseable event: {e}");
            return;
        }
    };

    match event {
        Event::DomainAdded { domain } | Event::ForceRenew { domain } => {
            tracing::info!(domain = %domain, "fast-path reschedule from inbound event");
            if let Err(e) = scheduler.reschedule(&domain, now_unix()).await {
                tracing::warn!(domain = %domain, "failed to reschedule: {e}");
            }
        }
        Event::CertUpdated { .. } => {
            // The Manager's own output; nothing to do.
        }
    }
}

/// Attempts at most one issuance per main-loop iteration.
async fn maybe_issue(scheduler: &Scheduler, issuer: &Issuer) {
    let due = match scheduler.pop_one_due(now_unix()).await {
        Ok(due) => due,
        Err(e) => {
            tracing::warn!("failed to query schedule: {e}");
            return;
        }
    };

    let Some(domain) = due else { return };

    tracing::info!(domain = %domain, "issuing");
    if let Err(e) = issuer.process(&domain).await {
        tracing::warn!(domain = %domain, "issuance action failed: {e}");
    }
}
