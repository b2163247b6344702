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

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `generation` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL without path, query or fragment
    /// - `base_path` does not start and end with `/`
    /// - any `preload_urls` entry is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `preload_concurrency` is 0 or exceeds 16
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "generation".into(),
                hint: "Set MAPCACHE_GENERATION, e.g. map-resources-v1".into(),
            });
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be http or https".into() });
        }
        if origin.path() != "/" || origin.query().is_some() || origin.fragment().is_some() {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: "must not carry a path, query or fragment".into(),
            });
        }

        if !self.base_path.starts_with('/') || !self.base_path.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "base_path".into(),
                reason: "must start and end with '/'".into(),
            });
        }

        if self.preload_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(ConfigError::Invalid { field: "preload_urls".into(), reason: "entries must not be empty".into() });
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

        if self.preload_concurrency == 0 || self.preload_concurrency > 16 {
            return Err(ConfigError::Invalid {
                field: "preload_concurrency".into(),
                reason: "must be between 1 and 16".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.preload_urls.is_empty() {
            tracing::warn!(generation = %self.generation, "preload_urls is empty; install will only create the generation");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_generation() {
        let config = AppConfig { generation: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "generation"));
    }

    #[test]
    fn test_validate_origin_with_path() {
        let config = AppConfig { origin: "http://localhost:7000/app".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://localhost".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_base_path_shape() {
        for base_path in ["app/", "/app", ""] {
            let config = AppConfig { base_path: base_path.into(), ..Default::default() };
            let result = config.validate();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_path"));
        }
        let config = AppConfig { base_path: "/app/".into(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_blank_preload_entry() {
        let config = AppConfig { preload_urls: vec!["./".into(), " ".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "preload_urls"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_preload_concurrency_bounds() {
        for n in [0, 17] {
            let config = AppConfig { preload_concurrency: n, ..Default::default() };
            let result = config.validate();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "preload_concurrency"));
        }
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, preload_concurrency: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_values() {
        let config = AppConfig {
            max_bytes: 50 * 1024 * 1024,
            timeout_ms: 300_000,
            preload_concurrency: 16,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
