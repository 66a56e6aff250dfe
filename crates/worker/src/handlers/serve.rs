//! Fetch interception: cache-first serve with network fallback.
//!
//! Policy, in order:
//! 1. A stored entry under the request key is returned verbatim.
//! 2. Otherwise one network attempt.
//! 3. Non-200 or cross-origin responses are returned uncached.
//! 4. Plain same-origin 200s are returned immediately; a detached task writes
//!    the copy into the store (failures logged, never propagated).
//! 5. If the whole chain fails, the cached offline-fallback document is
//!    served; absent that, the original error surfaces to the caller.

use shellcache_client::{FetchedResponse, Fetcher, Url, classify, resolve};
use shellcache_core::store::request_key;
use shellcache_core::{AppConfig, CachedResponse, Error, ResponseKind, StoreDb};

use crate::events::{FetchReply, PageRequest, ServeSource};
use crate::handlers::response_record;

/// A successfully served response and where it came from.
#[derive(Debug)]
pub enum Served {
    Cache(CachedResponse),
    Network(FetchedResponse, ResponseKind),
    Fallback(CachedResponse),
}

impl Served {
    pub fn into_reply(self) -> FetchReply {
        match self {
            Served::Cache(entry) => FetchReply::from_entry(&entry, ServeSource::Cache),
            Served::Fallback(entry) => FetchReply::from_entry(&entry, ServeSource::Fallback),
            Served::Network(response, kind) => FetchReply {
                url: response.url.as_str().to_string(),
                status: response.status.as_u16(),
                kind,
                content_type: response.content_type.clone(),
                headers: crate::handlers::header_pairs(&response.headers),
                body_hex: hex::encode(&response.bytes),
                source: ServeSource::Network,
            },
        }
    }
}

/// Implementation of the fetch operation.
pub async fn serve_impl(
    store: &StoreDb,
    config: &AppConfig,
    base: &Url,
    fetcher: &dyn Fetcher,
    request: &PageRequest,
) -> Result<Served, Error> {
    match lookup_or_fetch(store, config, base, fetcher, request).await {
        Ok(served) => Ok(served),
        Err(err) => {
            tracing::warn!(url = %request.url, error = %err, "serve chain failed, trying offline fallback");
            match fallback_entry(store, config, base).await {
                Some(entry) => Ok(Served::Fallback(entry)),
                None => Err(err),
            }
        }
    }
}

async fn lookup_or_fetch(
    store: &StoreDb,
    config: &AppConfig,
    base: &Url,
    fetcher: &dyn Fetcher,
    request: &PageRequest,
) -> Result<Served, Error> {
    let url = resolve(base, &request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = request_key(&request.method, url.as_str());

    if let Some(entry) = store.get_response(&config.cache_name, &key).await? {
        tracing::debug!(url = %url, "cache hit");
        return Ok(Served::Cache(entry));
    }

    tracing::debug!(url = %url, "cache miss, going to network");
    let response = fetcher.fetch(&request.method, &url, request.accept.as_deref()).await?;

    let kind = classify(base, &response.final_url);
    if response.status.as_u16() != 200 || kind != ResponseKind::Basic {
        return Ok(Served::Network(response, kind));
    }

    let record = response_record(&key, &url, &response, kind);
    let store = store.clone();
    let cache = config.cache_name.clone();
    tokio::spawn(async move {
        if let Err(err) = store.put_response(&cache, &record).await {
            tracing::warn!(key = %record.key, error = %err, "background cache write failed");
        }
    });

    Ok(Served::Network(response, kind))
}

/// Look up the offline-fallback document, swallowing lookup errors.
///
/// This runs on an already-failing path; a store error here must not mask
/// the original failure.
async fn fallback_entry(store: &StoreDb, config: &AppConfig, base: &Url) -> Option<CachedResponse> {
    let url = resolve(base, &config.offline_fallback).ok()?;
    let key = request_key("GET", url.as_str());
    match store.get_response(&config.cache_name, &key).await {
        Ok(entry) => entry,
        Err(err) => {
            tracing::warn!(error = %err, "offline fallback lookup failed");
            None
        }
    }
}
