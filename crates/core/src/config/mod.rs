//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// The defaults describe the retirement-calculator page this worker ships
/// configured for; pointing the worker at another page is a matter of
/// overriding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the page being cached; relative manifest entries and
    /// request URLs resolve against it.
    ///
    /// Set via SHELLCACHE_BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the current cache generation.
    ///
    /// Set via SHELLCACHE_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Assets fetched into the cache on install, in order.
    ///
    /// Set via SHELLCACHE_PRECACHE environment variable.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served when the whole lookup-or-fetch chain fails.
    ///
    /// Set via SHELLCACHE_OFFLINE_FALLBACK environment variable.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Background-sync tag this worker acknowledges.
    ///
    /// Set via SHELLCACHE_SYNC_TAG environment variable.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Notification appearance for push events.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of concurrent install fetches.
    ///
    /// Set via SHELLCACHE_INSTALL_CONCURRENCY environment variable.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: u8,
}

/// Notification appearance shown for push events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub title: String,

    /// Body used when a push event carries no payload.
    #[serde(default = "default_notification_body")]
    pub default_body: String,

    #[serde(default = "default_notification_icon")]
    pub icon: String,

    #[serde(default = "default_notification_icon")]
    pub badge: String,

    /// Vibration pattern in milliseconds (on, off, on, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    /// Constant key carried in the notification metadata.
    #[serde(default = "default_primary_key")]
    pub primary_key: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_base_url() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_name() -> String {
    "retirement-calculator-v1".into()
}

fn default_precache() -> Vec<String> {
    vec![
        "./retirement_calculator.html".into(),
        "./manifest.json".into(),
        "./icon-192.png".into(),
        "./icon-512.png".into(),
        "https://cdn.plot.ly/plotly-2.27.0.min.js".into(),
    ]
}

fn default_offline_fallback() -> String {
    "./retirement_calculator.html".into()
}

fn default_sync_tag() -> String {
    "sync-calculations".into()
}

fn default_notification_title() -> String {
    "Retirement Calculator".into()
}

fn default_notification_body() -> String {
    "New update available".into()
}

fn default_notification_icon() -> String {
    "./icon-192.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![100, 50, 100]
}

fn default_primary_key() -> u32 {
    1
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_install_concurrency() -> u8 {
    4
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            default_body: default_notification_body(),
            icon: default_notification_icon(),
            badge: default_notification_icon(),
            vibrate: default_vibrate(),
            primary_key: default_primary_key(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            base_url: default_base_url(),
            cache_name: default_cache_name(),
            precache: default_precache(),
            offline_fallback: default_offline_fallback(),
            sync_tag: default_sync_tag(),
            notification: NotificationConfig::default(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            install_concurrency: default_install_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.cache_name, "retirement-calculator-v1");
        assert_eq!(config.offline_fallback, "./retirement_calculator.html");
        assert_eq!(config.sync_tag, "sync-calculations");
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.install_concurrency, 4);
    }

    #[test]
    fn test_default_precache_order() {
        let config = AppConfig::default();
        assert_eq!(
            config.precache,
            vec![
                "./retirement_calculator.html",
                "./manifest.json",
                "./icon-192.png",
                "./icon-512.png",
                "https://cdn.plot.ly/plotly-2.27.0.min.js",
            ]
        );
    }

    #[test]
    fn test_default_notification() {
        let n = AppConfig::default().notification;
        assert_eq!(n.title, "Retirement Calculator");
        assert_eq!(n.default_body, "New update available");
        assert_eq!(n.icon, "./icon-192.png");
        assert_eq!(n.badge, "./icon-192.png");
        assert_eq!(n.vibrate, vec![100, 50, 100]);
        assert_eq!(n.primary_key, 1);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
