//! Engine configuration
//!
//! Designed for [TOML](https://toml.io/en/):
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl = "1m 30s"
//! capacity = 512
//! ```
//!
//! Every key is optional. The base servings of the recipes are not
//! configurable, see [`BASE_SERVINGS`](crate::scale::BASE_SERVINGS).

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Configuration of the engine
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Resolved view caching
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Configuration of [`CachedResolver`](crate::cache::CachedResolver)
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    /// When disabled, every call goes to the resolver
    pub enabled: bool,
    /// How long a resolved view is served from the cache
    #[serde(deserialize_with = "human_duration")]
    pub ttl: Duration,
    /// Maximum number of cached views
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(60),
            capacity: 1024,
        }
    }
}

/// Error parsing an [`EngineConfig`]
#[derive(Debug, Error)]
#[error("Invalid engine configuration: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

impl EngineConfig {
    /// Parse a TOML configuration
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}
