// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Declarative configuration of a [`Client`][super::Client].
///
/// Applied with [`ClientBuilder::config`][super::ClientBuilder::config]. With the `serde`
/// feature enabled the type can be deserialized; missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use rebound::ClientConfig;
/// use rebound::retry::RetryConfig;
///
/// let mut config = ClientConfig::default();
/// config.retry = RetryConfig::new().with_max_retries(4);
/// config.user_agent = Some("my-app/1.0".to_string());
/// config.cache.enabled = true;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct ClientConfig {
    /// Rate-limit retry settings.
    pub retry: RetryConfig,
    /// Overrides the default `User-Agent` header.
    pub user_agent: Option<String>,
    /// Response cache settings.
    pub cache: CacheConfig,
}

/// Response cache settings.
///
/// When enabled, the client uses the [`DefaultCacheMiddleware`][crate::cache::DefaultCacheMiddleware]
/// over a [`MemoryStore`][crate::cache::MemoryStore] bounded by these settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct CacheConfig {
    /// Turns caching on.
    pub enabled: bool,
    /// Seconds an entry stays valid. Unbounded when absent.
    pub time_to_live_secs: Option<u64>,
    /// Maximum number of entries. Unbounded when absent.
    pub max_capacity: Option<u64>,
}

impl CacheConfig {
    /// Returns the entry lifetime, if bounded.
    #[must_use]
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_secs.map(Duration::from_secs)
    }
}
