//! Store abstraction shared by the Redis and in-memory backends

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a cache store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (refused, dropped, timed out)
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// The store was reachable but the command failed
    #[error("Cache store command failed: {0}")]
    Command(String),

    /// A diagnostic reply could not be interpreted
    #[error("Unexpected cache store reply: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether this error means the store is unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// A string key-value store with per-key expiry
///
/// Implementations must be safe to share between concurrent requests. No
/// atomicity is promised across calls: a `get` followed by `set_with_ttl`
/// may interleave with other writers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, resetting its expiry to now + `ttl_seconds`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64)
        -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Deletes a single key, returning the number of keys removed (0 or 1)
    async fn delete(&self, key: &str) -> Result<u64, StoreError>;

    /// Lists all live keys starting with `prefix`
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Deletes the given keys, returning how many existed
    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Fails with [`StoreError::Unavailable`] when the store is unreachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Human-readable memory usage, for diagnostics only
    async fn info_memory(&self) -> Result<String, StoreError>;
}
