//! Install: precache the asset manifest.
//!
//! Population is best-effort, not atomic: each asset fetches and stores
//! independently, and a failed asset only costs that asset. Install itself
//! fails only when the store cannot be opened.

use std::sync::Arc;

use shellcache_client::{Fetcher, Url, classify, resolve};
use shellcache_core::store::request_key;
use shellcache_core::{AppConfig, Error, StoreDb};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::handlers::response_record;
use crate::host::Host;

/// Implementation of the install operation.
///
/// The skip-waiting directive is issued whether or not population succeeded;
/// a half-filled cache still serves better than a superseded generation.
pub async fn install_impl(
    store: &StoreDb,
    config: &AppConfig,
    base: &Url,
    fetcher: &Arc<dyn Fetcher>,
    host: &dyn Host,
) -> Result<(), Error> {
    let result = precache_manifest(store, config, base, fetcher).await;
    host.skip_waiting().await?;
    result
}

async fn precache_manifest(
    store: &StoreDb,
    config: &AppConfig,
    base: &Url,
    fetcher: &Arc<dyn Fetcher>,
) -> Result<(), Error> {
    store.open_cache(&config.cache_name).await?;

    let semaphore = Arc::new(Semaphore::new(config.install_concurrency as usize));
    let mut join_set = JoinSet::new();

    for asset in config.precache.clone() {
        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let store = store.clone();
        let fetcher = Arc::clone(fetcher);
        let base = base.clone();
        let cache = config.cache_name.clone();

        join_set.spawn(async move {
            // NOTE: Hold permit for task duration to enforce concurrency limit
            let _permit = permit;
            match precache_one(&store, &cache, &base, fetcher.as_ref(), &asset).await {
                Ok(()) => {
                    tracing::debug!(asset = %asset, "precached");
                    true
                }
                Err(err) => {
                    tracing::warn!(asset = %asset, error = %err, "failed to precache asset");
                    false
                }
            }
        });
    }

    let mut cached = 0u32;
    let mut failed = 0u32;
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(true) => cached += 1,
            Ok(false) => failed += 1,
            Err(err) => {
                tracing::warn!(error = %err, "precache task panicked");
                failed += 1;
            }
        }
    }

    tracing::info!(
        cache = %config.cache_name,
        cached,
        failed,
        total = config.precache.len(),
        "install precache complete"
    );

    Ok(())
}

async fn precache_one(
    store: &StoreDb,
    cache: &str,
    base: &Url,
    fetcher: &dyn Fetcher,
    asset: &str,
) -> Result<(), Error> {
    let url = resolve(base, asset).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let response = fetcher.fetch("GET", &url, None).await?;

    if response.status.as_u16() != 200 {
        return Err(Error::HttpError(format!("status {}", response.status.as_u16())));
    }

    // Unlike the serve path, manifest assets cache regardless of origin; the
    // external CDN entry is expected here.
    let kind = classify(base, &response.final_url);
    let key = request_key("GET", url.as_str());
    let record = response_record(&key, &url, &response, kind);

    store.put_response(cache, &record).await
}
