//! HTTP fetch pipeline for the offline-caching worker.
//!
//! ### Policy
//! - One network attempt per request; no retries.
//! - Transport failures (connect, TLS, timeout) are errors. Non-2xx statuses
//!   are NOT errors: the response is returned as-is so the serve policy can
//!   decide whether to cache or pass it through.
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, Method, StatusCode, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

use shellcache_core::{Error, ResponseKind};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Classify where a response was delivered from, relative to the page.
///
/// Redirects count: a same-origin request that lands cross-origin is `Cors`.
pub fn classify(page_base: &Url, final_url: &Url) -> ResponseKind {
    if page_base.origin() == final_url.origin() {
        ResponseKind::Basic
    } else {
        ResponseKind::Cors
    }
}

/// The network seam the worker's operation handlers fetch through.
///
/// The real implementation is [`FetchClient`]; tests substitute a scripted
/// stub so handler behavior is exercised without a network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, method: &str, url: &Url, accept: Option<&str>) -> Result<FetchedResponse, Error>;
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Respects the configured redirect and byte limits. The body is read to
    /// completion here; callers receive owned bytes they can persist and
    /// return independently.
    async fn fetch(&self, method: &str, url: &Url, accept: Option<&str>) -> Result<FetchedResponse, Error> {
        let start = Instant::now();

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid HTTP method: {}", e)))?;

        let mut request = self.http.request(method, url.clone());
        request = request.header(
            "Accept",
            accept.unwrap_or("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );

        let response = request
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("network error: {}", e)))?;

        let status = response.status();

        let content_length = response.content_length();
        if let Some(len) = content_length
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} {} in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(FetchedResponse { url: url.clone(), final_url, status, content_type, headers, bytes, fetch_ms })
    }
}
