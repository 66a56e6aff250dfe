//! URL resolution for consistent cache keys.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request identifier against the page base URL.
///
/// Manifest entries and intercepted requests address resources either as
/// paths relative to the page (`./icon-192.png`) or as absolute URLs
/// (`https://cdn.example/lib.js`). Both forms normalize the same way so a
/// resource always maps to one cache key:
///
/// 1. Trim leading/trailing whitespace
/// 2. Join against the base (absolute inputs replace it entirely)
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = resolved.host_str() {
        let lowered = host.to_lowercase();
        resolved
            .set_host(Some(lowered.as_str()))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    resolved.set_fragment(None);

    Ok(resolved)
}
