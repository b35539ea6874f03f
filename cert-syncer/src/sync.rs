//! Full sync
//!
//! Scans every artifact key in the Store and writes its `crt`/`key` fields
//! to disk. A Syncer never writes to Store; this is read-only against it.
//! Orphan files (no corresponding artifact key) are left untouched —
//! append-only behaviour is intentional, per spec §4.6.

use cert_core::keys::{domain_from_cert_data_key, CERT_DATA_SCAN_PATTERN};
use cert_core::Result;
use cert_store::StoreApi;
use std::path::Path;

/// Scans all `cert_data:*` keys and writes each domain's certificate and
/// key to `<certs_dir>/<domain>.{crt,key}`. Returns the domains written.
pub async fn full_sync(store: &dyn StoreApi, certs_dir: &Path) -> Result<Vec<String>> {
    std::fs::create_dir_all(certs_dir).map_err(cert_core::Error::Io)?;

    let keys = store.scan_match(CERT_DATA_SCAN_PATTERN).await?;
    let mut synced = Vec::new();

    for key in keys {
        let Some(domain) = domain_from_cert_data_key(&key) else { continue };
        let fields = store.hgetall(&key).await?;
        let (Some(crt), Some(key_pem)) = (fields.get("crt"), fields.get("key")) else {
            tracing::warn!(domain = %domain, "artifact missing crt/key field, skipping");
            continue;
        };

        // Write both before treating the domain as synced, so a reader
        // never observes a .crt without its matching .key.
        std::fs::write(certs_dir.join(format!("{domain}.crt")), crt).map_err(cert_core::Error::Io)?;
        std::fs::write(certs_dir.join(format!("{domain}.key")), key_pem).map_err(cert_core::Error::Io)?;
        synced.push(domain.to_string());
    }

    Ok(synced)
}
