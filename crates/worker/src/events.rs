//! Wire types for the stdio event transport.
//!
//! The host runtime delivers one JSON object per stdin line; the worker
//! answers with [`OutboundFrame`] lines on stdout. Fetch events carry an `id`
//! the matching reply echoes, so the host can interleave requests freely.

use serde::{Deserialize, Serialize};
use shellcache_core::{CachedResponse, ResponseKind};

use crate::host::NotificationOptions;

/// A lifecycle or notification event delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch {
        id: u64,
        request: PageRequest,
    },
    Sync {
        tag: String,
    },
    Push {
        #[serde(default)]
        data: Option<String>,
    },
}

/// A request intercepted from the owning page.
///
/// The URL may be relative to the page (`./icon-192.png`) or absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeSource {
    Cache,
    Network,
    Fallback,
}

/// The response half of a fetch reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReply {
    pub url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body bytes, hex-encoded for the JSON transport.
    pub body_hex: String,
    pub source: ServeSource,
}

impl FetchReply {
    /// Build a reply from a stored entry, verbatim.
    pub fn from_entry(entry: &CachedResponse, source: ServeSource) -> Self {
        let headers = entry
            .headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            url: entry.url.clone(),
            status: entry.status,
            kind: entry.kind,
            content_type: entry.content_type.clone(),
            headers,
            body_hex: hex::encode(&entry.body),
            source,
        }
    }
}

/// A frame the worker emits on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Reply to a fetch event; exactly one of `response`/`error` is set.
    FetchResult {
        id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<FetchReply>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Directive: activate this worker generation without waiting.
    SkipWaiting,
    /// Directive: route open pages to this generation immediately.
    ClaimClients,
    /// Directive: display a notification.
    Notification {
        title: String,
        options: NotificationOptions,
    },
}
