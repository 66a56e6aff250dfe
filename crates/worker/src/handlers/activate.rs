//! Activate: prune stale cache generations.

use shellcache_core::{AppConfig, Error, StoreDb};

use crate::host::Host;

/// Implementation of the activate operation.
///
/// Deletes every cache generation other than the current one, then claims
/// open pages. A delete failure propagates and fails activation; there is no
/// compensating action.
pub async fn activate_impl(store: &StoreDb, config: &AppConfig, host: &dyn Host) -> Result<(), Error> {
    let names = store.list_caches().await?;

    for name in names {
        if name != config.cache_name {
            tracing::info!(cache = %name, "deleting stale cache");
            store.delete_cache(&name).await?;
        }
    }

    host.claim_clients().await?;

    Ok(())
}
