//! shellcache worker entry point.
//!
//! Boots the offline-caching agent on the stdio event transport. Logging goes
//! to stderr to avoid interfering with the JSON frames on stdout.

use std::sync::Arc;

use anyhow::Result;
use shellcache_client::{FetchClient, FetchConfig};
use shellcache_core::{AppConfig, StoreDb};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod agent;
mod events;
mod handlers;
mod host;
#[cfg(test)]
mod testutil;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache = %config.cache_name,
        db_path = %config.db_path.display(),
        "starting shellcache worker on stdio transport"
    );

    let store = StoreDb::open(&config.db_path).await?;

    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    };
    let fetcher = Arc::new(FetchClient::new(fetch_config)?);

    let (tx, rx) = mpsc::channel(64);
    let host = Arc::new(host::ChannelHost::new(tx.clone()));
    let cache_agent = Arc::new(agent::CacheAgent::new(store, config, fetcher, host)?);

    let writer = tokio::spawn(host::write_frames(rx));

    agent::run(cache_agent, tx).await?;

    // All senders are gone once run returns; let the writer flush and stop.
    writer.await?;

    Ok(())
}
