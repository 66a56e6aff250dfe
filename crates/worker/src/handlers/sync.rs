//! Background sync: reserved extension point.

use shellcache_core::{AppConfig, Error};

/// Implementation of the sync operation.
///
/// Acknowledges the calculation-sync tag and completes; there is no queued
/// data to move yet. Unknown tags are ignored.
pub async fn sync_impl(config: &AppConfig, tag: &str) -> Result<(), Error> {
    if tag == config.sync_tag {
        tracing::debug!(tag, "sync acknowledged");
    } else {
        tracing::debug!(tag, "ignoring unknown sync tag");
    }
    Ok(())
}
