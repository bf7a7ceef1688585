//! Cache-aside weather lookups and cache administration
//!
//! [`WeatherGateway`] checks the cache store first, calls the upstream
//! provider on a miss, and writes the raw response back with a fixed TTL. It
//! keeps no state of its own between requests: the store owns entry lifetime
//! and the gateway only decides when to read, write or invalidate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, StoreError};
use crate::data::{WeatherClient, WeatherError, WeatherRecord, WeatherView};

/// Prefix shared by every weather cache key
pub const KEY_PREFIX: &str = "weather:";

/// Reported by cache stats when the store cannot be queried
pub const STORE_UNAVAILABLE: &str = "Redis not available";

/// Builds the cache key for a user-supplied city name
///
/// Surrounding whitespace is ignored and case is folded, so "Paris",
/// " paris" and "PARIS" all address the same entry.
pub fn city_key(city: &str) -> String {
    format!("{}{}", KEY_PREFIX, city.trim().to_lowercase())
}

/// Errors surfaced by weather lookups and cache administration
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No provider credential was configured
    #[error("OpenWeather API key not configured")]
    Configuration,

    /// The provider returned an empty payload
    #[error("City not found")]
    NotFound,

    /// The provider could not be reached or rejected the request
    #[error("Weather API error: {0}")]
    Upstream(#[from] WeatherError),

    /// The cache store failed on a path that does not tolerate it
    #[error("Unexpected error: {0}")]
    Store(#[from] StoreError),
}

/// Overall service status reported by the health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

/// Reachability of the cache store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Connected,
    Disconnected,
}

/// Whether a provider credential is present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Configured,
    Missing,
}

/// Result of [`WeatherGateway::health_check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub redis: StoreStatus,
    pub api_key: ApiKeyStatus,
}

/// Result of [`WeatherGateway::cache_stats`]
///
/// Serialized untagged: either the statistics or an `{"error": ...}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheStats {
    Available {
        total_cached_cities: usize,
        memory_usage: String,
    },
    Unavailable {
        error: String,
    },
}

/// Cache-aside front for the upstream weather provider
pub struct WeatherGateway {
    store: Arc<dyn CacheStore>,
    client: WeatherClient,
    api_key: Option<String>,
    cache_expiry: u64,
}

impl std::fmt::Debug for WeatherGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGateway")
            .field("client", &self.client)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cache_expiry", &self.cache_expiry)
            .finish()
    }
}

impl WeatherGateway {
    /// Creates a gateway over an explicitly constructed store and client
    ///
    /// An empty `api_key` is treated as missing.
    pub fn new(
        store: Arc<dyn CacheStore>,
        client: WeatherClient,
        api_key: Option<String>,
        cache_expiry: u64,
    ) -> Self {
        Self {
            store,
            client,
            api_key: api_key.filter(|key| !key.is_empty()),
            cache_expiry,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Seconds a freshly fetched record stays cached
    pub fn cache_expiry(&self) -> u64 {
        self.cache_expiry
    }

    /// Returns the raw record for `city`, from cache or upstream
    ///
    /// On a miss the upstream payload is written back with the configured
    /// TTL. That write is best-effort: a failure is logged and the freshly
    /// fetched record is still returned. An empty upstream payload yields
    /// `Ok(None)` and is not cached.
    pub async fn fetch(&self, city: &str) -> Result<Option<WeatherRecord>, GatewayError> {
        let key = city_key(city);

        if let Some(cached) = self.store.get(&key).await? {
            match serde_json::from_str::<WeatherRecord>(&cached) {
                Ok(record) => {
                    debug!(key = %key, "Cache hit");
                    return Ok(Some(record));
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
            }
        }

        debug!(key = %key, "Cache miss");
        let api_key = self.api_key.as_deref().ok_or(GatewayError::Configuration)?;

        info!(city, "Fetching weather from upstream");
        let record = self.client.fetch_current(city, api_key).await?;

        if record.is_empty() {
            return Ok(None);
        }

        match serde_json::to_string(&record) {
            Ok(serialized) => {
                if let Err(e) = self
                    .store
                    .set_with_ttl(&key, &serialized, self.cache_expiry)
                    .await
                {
                    warn!(key = %key, error = %e, "Failed to cache weather response");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize weather response"),
        }

        Ok(Some(record))
    }

    /// Looks up the normalized weather view for `city`
    ///
    /// The `cached` flag is a fresh existence check made after the lookup,
    /// so it is true both for cache hits and for records just written back.
    pub async fn get_weather(&self, city: &str) -> Result<WeatherView, GatewayError> {
        if !self.has_api_key() {
            return Err(GatewayError::Configuration);
        }

        let record = self.fetch(city).await?.ok_or(GatewayError::NotFound)?;
        let cached = self.store.exists(&city_key(city)).await?;

        Ok(WeatherView::from_record(&record, cached))
    }

    /// Counts cached cities and reports store memory usage
    ///
    /// Never fails: store errors are reported inside the returned value.
    pub async fn cache_stats(&self) -> CacheStats {
        match self.try_cache_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "Cache stats unavailable");
                CacheStats::Unavailable {
                    error: STORE_UNAVAILABLE.to_string(),
                }
            }
        }
    }

    async fn try_cache_stats(&self) -> Result<CacheStats, StoreError> {
        let keys = self.store.list_keys(KEY_PREFIX).await?;
        let memory_usage = self.store.info_memory().await?;
        Ok(CacheStats::Available {
            total_cached_cities: keys.len(),
            memory_usage,
        })
    }

    /// Removes the cached entry for `city`, returning whether one existed
    pub async fn clear_cache(&self, city: &str) -> Result<bool, GatewayError> {
        let key = city_key(city);
        let removed = self.store.delete(&key).await?;
        info!(key = %key, removed, "Cleared cache entry");
        Ok(removed > 0)
    }

    /// Removes every weather entry, returning how many keys were listed
    ///
    /// Keys written between listing and deletion may survive.
    pub async fn clear_all_cache(&self) -> Result<u64, GatewayError> {
        let keys = self.store.list_keys(KEY_PREFIX).await?;
        if !keys.is_empty() {
            self.store.delete_many(&keys).await?;
        }
        info!(count = keys.len(), "Cleared weather cache");
        Ok(keys.len() as u64)
    }

    /// Pings the store; never fails
    pub async fn health_check(&self) -> HealthReport {
        let api_key = if self.has_api_key() {
            ApiKeyStatus::Configured
        } else {
            ApiKeyStatus::Missing
        };

        match self.store.ping().await {
            Ok(()) => HealthReport {
                status: ServiceStatus::Healthy,
                redis: StoreStatus::Connected,
                api_key,
            },
            Err(e) => {
                if e.is_unavailable() {
                    warn!(error = %e, "Cache store unreachable");
                } else {
                    warn!(error = %e, "Cache store ping failed");
                }
                HealthReport {
                    status: ServiceStatus::Degraded,
                    redis: StoreStatus::Disconnected,
                    api_key,
                }
            }
        }
    }
}
