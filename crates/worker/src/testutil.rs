//! Test doubles shared by the handler tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shellcache_client::{Bytes, FetchedResponse, Fetcher, HeaderMap, StatusCode, Url};
use shellcache_core::store::request_key;
use shellcache_core::{AppConfig, CachedResponse, Error, ResponseKind, StoreDb};

use crate::host::{Host, NotificationOptions};

/// Configuration pointed at a fixed test origin.
pub fn test_config() -> AppConfig {
    AppConfig { base_url: "https://app.example.com/calculator/".into(), ..Default::default() }
}

/// Insert a plain same-origin 200 entry under its GET key; returns the key.
pub async fn insert_entry(store: &StoreDb, cache: &str, url: &str, body: &[u8]) -> String {
    let key = request_key("GET", url);
    let entry = CachedResponse {
        key: key.clone(),
        url: url.to_string(),
        status: 200,
        kind: ResponseKind::Basic,
        content_type: Some("text/html".to_string()),
        headers_json: None,
        body: body.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    };
    store.put_response(cache, &entry).await.unwrap();
    key
}

enum StubOutcome {
    Respond { status: u16, body: Vec<u8> },
    Fail(String),
}

/// Scripted [`Fetcher`]: responds per-URL, errors for anything unscripted.
///
/// An empty stub behaves like being offline.
#[derive(Default)]
pub struct StubFetcher {
    outcomes: Mutex<HashMap<String, StubOutcome>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, url: &str, status: u16, body: &[u8]) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), StubOutcome::Respond { status, body: body.to_vec() });
        self
    }

    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), StubOutcome::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, _method: &str, url: &Url, _accept: Option<&str>) -> Result<FetchedResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let outcomes = self.outcomes.lock().unwrap();
        match outcomes.get(url.as_str()) {
            Some(StubOutcome::Respond { status, body }) => Ok(FetchedResponse {
                url: url.clone(),
                final_url: url.clone(),
                status: StatusCode::from_u16(*status).unwrap(),
                content_type: Some("text/html".to_string()),
                headers: HeaderMap::new(),
                bytes: Bytes::from(body.clone()),
                fetch_ms: 0,
            }),
            Some(StubOutcome::Fail(message)) => Err(Error::HttpError(message.clone())),
            None => Err(Error::HttpError("offline".to_string())),
        }
    }
}

/// Recording [`Host`]: counts directives and keeps shown notifications.
#[derive(Default)]
pub struct RecordingHost {
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
    notifications: Mutex<Vec<(String, NotificationOptions)>>,
}

impl RecordingHost {
    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn last_notification(&self) -> Option<(String, NotificationOptions)> {
        self.notifications.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn show_notification(&self, title: &str, options: NotificationOptions) -> Result<(), Error> {
        self.notifications.lock().unwrap().push((title.to_string(), options));
        Ok(())
    }
}
