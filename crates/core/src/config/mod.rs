//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MAPCACHE_*)
//! 2. TOML config file (if MAPCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MAPCACHE_*)
/// 2. TOML config file (if MAPCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Bumping this on deployment invalidates every previously cached entry.
    /// Set via MAPCACHE_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Origin of the page the worker is attached to.
    ///
    /// Responses from this origin are classified as same-origin.
    /// Set via MAPCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path the worker is deployed under; relative preload entries resolve against it.
    ///
    /// Set via MAPCACHE_BASE_PATH environment variable.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// URLs fetched and stored at install time, in order.
    ///
    /// Set via MAPCACHE_PRELOAD_URLS environment variable (array syntax).
    #[serde(default = "default_preload_urls")]
    pub preload_urls: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via MAPCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via MAPCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to buffer per response.
    ///
    /// Set via MAPCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upper bound for a single network fetch, in milliseconds.
    ///
    /// Set via MAPCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of preload fetches in flight during install.
    ///
    /// Set via MAPCACHE_PRELOAD_CONCURRENCY environment variable.
    #[serde(default = "default_preload_concurrency")]
    pub preload_concurrency: usize,
}

fn default_generation() -> String {
    "map-resources-v1".into()
}

fn default_origin() -> String {
    "http://localhost:7000".into()
}

fn default_base_path() -> String {
    "/".into()
}

fn default_preload_urls() -> Vec<String> {
    vec![
        "./".into(),
        "https://api.mapbox.com/mapbox-gl-js/v2.14.1/mapbox-gl.css".into(),
        "https://api.mapbox.com/mapbox-gl-js/v2.14.1/mapbox-gl.js".into(),
        "https://api.mapbox.com/mapbox-gl-js/plugins/mapbox-gl-directions/v4.1.1/mapbox-gl-directions.css".into(),
        "https://api.mapbox.com/mapbox-gl-js/plugins/mapbox-gl-directions/v4.1.1/mapbox-gl-directions.js".into(),
    ]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mapcache.sqlite")
}

fn default_user_agent() -> String {
    "mapcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_preload_concurrency() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            origin: default_origin(),
            base_path: default_base_path(),
            preload_urls: default_preload_urls(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            preload_concurrency: default_preload_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The worker origin as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin does not parse.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Origin joined with the base path; the root relative preload entries resolve against.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if origin or base path are malformed.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        self.origin_url()?
            .join(&self.base_path)
            .map_err(|e| ConfigError::Invalid { field: "base_path".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MAPCACHE_`
    /// 2. TOML file from `MAPCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("MAPCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MAPCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
