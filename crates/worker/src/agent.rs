//! The cache agent: event routing and the stdio event loop.

use std::sync::Arc;

use shellcache_client::{Fetcher, Url};
use shellcache_core::{AppConfig, Error, StoreDb};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::events::{OutboundFrame, WorkerEvent};
use crate::handlers::{activate, install, push, serve, sync};
use crate::host::Host;

/// The offline-caching agent.
///
/// Holds the store, the network seam, and the host-directive channel; routes
/// each inbound event to its operation handler.
pub struct CacheAgent {
    store: StoreDb,
    config: AppConfig,
    base: Url,
    fetcher: Arc<dyn Fetcher>,
    host: Arc<dyn Host>,
}

impl CacheAgent {
    pub fn new(
        store: StoreDb,
        config: AppConfig,
        fetcher: Arc<dyn Fetcher>,
        host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        let base = Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self { store, config, base, fetcher, host })
    }

    /// Handle one event, returning the frame to emit for it, if any.
    ///
    /// Lifecycle handler failures are logged here rather than propagated: a
    /// failed install or activation must not take the event loop down with it.
    pub async fn dispatch(&self, event: WorkerEvent) -> Option<OutboundFrame> {
        match event {
            WorkerEvent::Install => {
                tracing::info!(cache = %self.config.cache_name, "install");
                if let Err(err) =
                    install::install_impl(&self.store, &self.config, &self.base, &self.fetcher, self.host.as_ref())
                        .await
                {
                    tracing::error!(error = %err, "install failed");
                }
                None
            }
            WorkerEvent::Activate => {
                tracing::info!(cache = %self.config.cache_name, "activate");
                if let Err(err) =
                    activate::activate_impl(&self.store, &self.config, self.host.as_ref()).await
                {
                    tracing::error!(error = %err, "activation failed");
                }
                None
            }
            WorkerEvent::Fetch { id, request } => {
                let result =
                    serve::serve_impl(&self.store, &self.config, &self.base, self.fetcher.as_ref(), &request).await;
                Some(match result {
                    Ok(served) => OutboundFrame::FetchResult {
                        id,
                        response: Some(served.into_reply()),
                        error: None,
                    },
                    Err(err) => OutboundFrame::FetchResult { id, response: None, error: Some(err.to_string()) },
                })
            }
            WorkerEvent::Sync { tag } => {
                if let Err(err) = sync::sync_impl(&self.config, &tag).await {
                    tracing::error!(error = %err, "sync failed");
                }
                None
            }
            WorkerEvent::Push { data } => {
                if let Err(err) = push::push_impl(&self.config, self.host.as_ref(), data).await {
                    tracing::error!(error = %err, "push notification failed");
                }
                None
            }
        }
    }
}

/// Read events from stdin until EOF, one JSON object per line.
///
/// Every event runs on its own task, so independent events interleave while
/// each awaits I/O. In-flight tasks are drained before returning; an event's
/// work is never abandoned because the input closed.
pub async fn run(agent: Arc<CacheAgent>, outbound: mpsc::Sender<OutboundFrame>) -> Result<(), Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events: JoinSet<()> = JoinSet::new();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkerEvent>(trimmed) {
            Ok(event) => {
                let agent = Arc::clone(&agent);
                let outbound = outbound.clone();
                events.spawn(async move {
                    if let Some(frame) = agent.dispatch(event).await
                        && outbound.send(frame).await.is_err()
                    {
                        tracing::warn!("outbound channel closed; dropping frame");
                    }
                });
            }
            Err(err) => tracing::warn!(error = %err, "ignoring malformed event frame"),
        }

        // Reap finished event tasks as we go.
        while let Some(result) = events.try_join_next() {
            if let Err(err) = result {
                tracing::error!(error = %err, "event task panicked");
            }
        }
    }

    while let Some(result) = events.join_next().await {
        if let Err(err) = result {
            tracing::error!(error = %err, "event task panicked");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FetchReply, PageRequest, ServeSource};
    use crate::testutil::{RecordingHost, StubFetcher, insert_entry, test_config};

    async fn test_agent(store: StoreDb, fetcher: StubFetcher) -> (CacheAgent, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let agent = CacheAgent::new(store, test_config(), Arc::new(fetcher), host.clone()).unwrap();
        (agent, host)
    }

    #[tokio::test]
    async fn test_dispatch_fetch_replies_with_cached_entry() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let config = test_config();
        insert_entry(
            &store,
            &config.cache_name,
            "https://app.example.com/calculator/retirement_calculator.html",
            b"shell",
        )
        .await;
        let (agent, _host) = test_agent(store, StubFetcher::new()).await;

        let frame = agent
            .dispatch(WorkerEvent::Fetch {
                id: 3,
                request: PageRequest {
                    method: "GET".into(),
                    url: "./retirement_calculator.html".into(),
                    accept: None,
                },
            })
            .await
            .unwrap();

        match frame {
            OutboundFrame::FetchResult { id, response: Some(FetchReply { source, body_hex, .. }), error: None } => {
                assert_eq!(id, 3);
                assert_eq!(source, ServeSource::Cache);
                assert_eq!(body_hex, hex::encode(b"shell"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_fetch_failure_carries_error() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let (agent, _host) = test_agent(store, StubFetcher::new()).await;

        let frame = agent
            .dispatch(WorkerEvent::Fetch {
                id: 9,
                request: PageRequest { method: "GET".into(), url: "./nope.json".into(), accept: None },
            })
            .await
            .unwrap();

        match frame {
            OutboundFrame::FetchResult { id, response: None, error: Some(message) } => {
                assert_eq!(id, 9);
                assert!(message.contains("HTTP_ERROR"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_lifecycle_events_emit_no_frames() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let (agent, host) = test_agent(store, StubFetcher::new()).await;

        assert!(agent.dispatch(WorkerEvent::Install).await.is_none());
        assert!(agent.dispatch(WorkerEvent::Activate).await.is_none());
        assert!(agent.dispatch(WorkerEvent::Sync { tag: "sync-calculations".into() }).await.is_none());

        assert_eq!(host.skip_waiting_calls(), 1);
        assert_eq!(host.claim_calls(), 1);
    }

    #[tokio::test]
    async fn test_bad_base_url_rejected() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let mut config = test_config();
        config.base_url = "not a url".into();
        let result = CacheAgent::new(
            store,
            config,
            Arc::new(StubFetcher::new()),
            Arc::new(RecordingHost::default()),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
