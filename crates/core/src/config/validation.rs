//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name`, `user_agent`, or `offline_fallback` is empty
    /// - `base_url` is not an http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `install_concurrency` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "base_url".into(),
                reason: "must be an absolute http(s) URL".into(),
            });
        }

        if self.offline_fallback.is_empty() {
            return Err(ConfigError::Invalid {
                field: "offline_fallback".into(),
                reason: "must not be empty".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.install_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "install_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }

        if self.precache.is_empty() {
            tracing::warn!("precache manifest is empty; install will cache nothing");
        }

        Ok(())
    }
}
