//! cert-syncer — follower process
//!
//! Subscribes to the event channel and, on startup and on every event
//! (regardless of its body), performs a full sync of Store artifacts to
//! disk and regenerates the proxy's dynamic TLS manifest. Never writes to
//! Store.

mod manifest;
mod sync;

use cert_core::config::SyncerConfig;
use cert_store::RedisStore;
use clap::Parser;
use futures::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cert-syncer")]
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

    let store_config = cert_core::config::StoreConfig::from_env()?;
    let syncer_config = SyncerConfig::from_env();

    tracing::info!("waiting for store at {}:{}", store_config.host, store_config.port);
    let store = RedisStore::connect_with_retry(&store_config.url()).await;
    tracing::info!("store ready, subscribing to {}", cert_core::EVENTS_CHANNEL);

    let mut events = Box::pin(store.subscribe(cert_core::EVENTS_CHANNEL).await?);

    run_once(&store, &syncer_config).await;

    while let Some(_payload) = events.next().await {
        // Full sync regardless of the event body; followers compensate for
        // at-most-once delivery by re-scanning, not by trusting the payload.
        run_once(&store, &syncer_config).await;
    }

    Ok(())
}

async fn run_once(store: &RedisStore, config: &SyncerConfig) {
    let synced = match sync::full_sync(store, &config.certs_dir).await {
        Ok(synced) => synced,
        Err(e) => {
            tracing::warn!("full sync failed: {e}");
            return;
        }
    };
    tracing::info!(count = synced.len(), "synced artifacts to disk");

    let pairs = match manifest::discover_certificate_pairs(&config.certs_dir) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::warn!("failed to enumerate certificate pairs: {e}");
            return;
        }
    };

    let rendered = match manifest::render(pairs) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!("failed to render manifest: {e}");
            return;
        }
    };

    if let Err(e) = manifest::install_atomically(&config.manifest_path, &rendered) {
        tracing::warn!("failed to install manifest: {e}");
    }
}
