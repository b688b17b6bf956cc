/// Cache settings for the snapshot store
///
/// All five settings are required; the embedding service loads them from the
/// environment at startup and treats failure as fatal. A store is only ever
/// constructed from validated settings, so a half-configured store cannot
/// exist.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Backend connection string, e.g. "redis://127.0.0.1/".
    pub cache_uri: String,
    /// Per-key expiry, refreshed on every save.
    pub ttl_seconds: u64,
    /// Per-key history depth, and the cap on merged fetch results.
    pub max_snapshots: usize,
    /// Batch-size hint for the key scan during fetch.
    pub scan_batch_size: usize,
    /// Namespace prefix of every snapshot key.
    pub key_prefix: String,
}

impl CacheSettings {
    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = CacheSettings {
            cache_uri: required("CACHE_URI")?,
            ttl_seconds: parsed("MARKET_DATA_TTL_SECONDS")?,
            max_snapshots: parsed("MARKET_DATA_MAX_SNAPSHOTS")?,
            scan_batch_size: parsed("MARKET_DATA_SCAN_BATCH_SIZE")?,
            key_prefix: required("MARKET_DATA_KEY_PREFIX")?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_uri.is_empty() {
            return Err(ConfigError::Missing("cache_uri"));
        }
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Missing("key_prefix"));
        }
        if self.ttl_seconds == 0 {
            return Err(invalid("ttl_seconds", "0"));
        }
        if self.max_snapshots == 0 {
            return Err(invalid("max_snapshots", "0"));
        }
        if self.scan_batch_size == 0 {
            return Err(invalid("scan_batch_size", "0"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Result<T, ConfigError> {
    let raw = required(name)?;
    raw.parse().map_err(|_| invalid(name, &raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CacheSettings {
        CacheSettings {
            cache_uri: "redis://127.0.0.1/".to_string(),
            ttl_seconds: 300,
            max_snapshots: 10,
            scan_batch_size: 100,
            key_prefix: "market".to_string(),
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut s = settings();
        s.ttl_seconds = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Invalid { .. })));

        let mut s = settings();
        s.max_snapshots = 0;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.scan_batch_size = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_empty_strings_rejected() {
        let mut s = settings();
        s.key_prefix.clear();
        assert!(matches!(s.validate(), Err(ConfigError::Missing("key_prefix"))));

        let mut s = settings();
        s.cache_uri.clear();
        assert!(s.validate().is_err());
    }
}
