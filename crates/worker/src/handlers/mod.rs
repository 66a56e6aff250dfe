//! Operation handlers for the host lifecycle events.
//!
//! One module per operation, routed by [`crate::agent::CacheAgent`].

pub mod activate;
pub mod install;
pub mod push;
pub mod serve;
pub mod sync;

use shellcache_client::{FetchedResponse, HeaderMap, Url};
use shellcache_core::{CachedResponse, ResponseKind};

/// Snapshot a fetched response into a store entry under its request key.
///
/// The entry is addressed by the canonical request URL, not the post-redirect
/// one, so a later identical request finds it.
pub(crate) fn response_record(key: &str, url: &Url, response: &FetchedResponse, kind: ResponseKind) -> CachedResponse {
    let headers = header_pairs(&response.headers);

    CachedResponse {
        key: key.to_string(),
        url: url.as_str().to_string(),
        status: response.status.as_u16(),
        kind,
        content_type: response.content_type.clone(),
        headers_json: serde_json::to_string(&headers).ok(),
        body: response.bytes.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Collect the string-representable headers of a response.
pub(crate) fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
