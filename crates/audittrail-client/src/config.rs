//! Client configuration
//!
//! Resolved in layers: defaults, then an optional TOML file, then
//! `AUDITTRAIL_*` environment variables. Command-line flags are applied on
//! top by the caller through the `with_*` builders.

use crate::cache::CacheSettings;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API base URL
pub const ENV_BASE_URL: &str = "AUDITTRAIL_BASE_URL";
/// Environment variable holding the token file path
pub const ENV_TOKEN_FILE: &str = "AUDITTRAIL_TOKEN_FILE";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "AUDITTRAIL_TIMEOUT_SECS";
/// Environment variable holding the undo window in milliseconds
pub const ENV_UNDO_GRACE_MS: &str = "AUDITTRAIL_UNDO_GRACE_MS";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Environment variable holds an unusable value
    #[error("{var} must be {expected}, got '{value}'")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// What was expected
        expected: &'static str,
        /// Value found
        value: String,
    },

    /// Value out of range
    #[error("{0}")]
    Invalid(String),
}

/// Everything needed to build an [`AuditTrail`](crate::AuditTrail) client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, without the `/api` suffix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Undo window for timeline deletes in milliseconds
    pub undo_grace_ms: u64,
    /// Freshness for resources without their own threshold, in seconds
    pub default_stale_secs: u64,
    /// Maximum cached responses
    pub cache_capacity: u64,
    /// Cached responses unused this long are evicted, in seconds
    pub idle_eviction_secs: u64,
    /// Where the session token is persisted; in memory when unset
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            undo_grace_ms: 5_000,
            default_stale_secs: 0,
            cache_capacity: 1_000,
            idle_eviction_secs: 300,
            token_file: None,
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file; missing keys keep their defaults
    ///
    /// # Errors
    /// Unreadable file or invalid TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Invalid TOML or wrongly typed values.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Defaults overridden by the process environment
    ///
    /// # Errors
    /// A numeric variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env(|var| std::env::var(var).ok())
    }

    /// Apply `AUDITTRAIL_*` overrides read through `lookup`
    ///
    /// # Errors
    /// A numeric variable that does not parse.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE).filter(|v| !v.is_empty()) {
            self.token_file = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_number(ENV_TIMEOUT_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_UNDO_GRACE_MS) {
            self.undo_grace_ms = parse_number(ENV_UNDO_GRACE_MS, value)?;
        }
        Ok(self)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the undo window
    #[must_use]
    pub fn with_undo_grace(mut self, grace: Duration) -> Self {
        self.undo_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the token file
    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Set the default freshness
    #[must_use]
    pub fn with_default_stale_time(mut self, stale: Duration) -> Self {
        self.default_stale_secs = stale.as_secs();
        self
    }

    /// Set the cache capacity
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Check values that would make the client unusable
    ///
    /// # Errors
    /// Empty base URL, zero timeout or zero cache capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Undo window
    #[must_use]
    pub fn undo_grace(&self) -> Duration {
        Duration::from_millis(self.undo_grace_ms)
    }

    /// Cache settings derived from this config
    #[must_use]
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            max_capacity: self.cache_capacity,
            idle_eviction: Duration::from_secs(self.idle_eviction_secs),
            default_stale_time: Duration::from_secs(self.default_stale_secs),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

fn parse_number(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        expected: "a non-negative integer",
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.undo_grace(), Duration::from_secs(5));
        assert_eq!(config.cache_settings(), CacheSettings::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            base_url = "https://audit.example.com"
            undo_grace_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://audit.example.com");
        assert_eq!(config.undo_grace(), Duration::from_millis(2500));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn file_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("client.toml"));

        let missing = ClientConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = ClientConfig::default()
            .with_base_url("http://file")
            .merge_env(env(&[
                (ENV_BASE_URL, "http://env"),
                (ENV_TOKEN_FILE, "/tmp/token.json"),
                (ENV_UNDO_GRACE_MS, "100"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.token_file, Some(PathBuf::from("/tmp/token.json")));
        assert_eq!(config.undo_grace_ms, 100);
    }

    #[test]
    fn bad_numeric_env_is_rejected() {
        let err = ClientConfig::default()
            .merge_env(env(&[(ENV_TIMEOUT_SECS, "ten")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "AUDITTRAIL_TIMEOUT_SECS must be a non-negative integer, got 'ten'"
        );
    }

    #[test]
    fn validation() {
        assert!(ClientConfig::default().with_base_url(" ").validate().is_err());
        assert!(ClientConfig::default().with_cache_capacity(0).validate().is_err());
    }
}
