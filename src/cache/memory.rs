//! In-process cache store
//!
//! Keeps entries in a map guarded by an async `RwLock`, each stamped with an
//! expiry. Expired entries are treated as absent and purged lazily on the
//! next write. Useful for tests and for running without Redis.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::store::{CacheStore, StoreError};

/// A single stored value with its lifetime
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The serialized payload
    value: String,
    /// When the value stops being visible
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Cache store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Formats a byte count the way Redis reports `used_memory_human`
pub(crate) fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];

    if bytes < 1024 {
        return format!("{}B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2}{}", value, unit)
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| StoreError::Command(format!("invalid expire time {}", ttl_seconds)))?;

        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) if !entry.is_expired(now) => Ok(1),
            _ => Ok(0),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| !entry.is_expired(now))
            .count();
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn info_memory(&self) -> Result<String, StoreError> {
        let entries = self.entries.read().await;
        let bytes = entries
            .iter()
            .map(|(key, entry)| key.len() + entry.value.len())
            .sum();
        Ok(human_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let store = MemoryStore::new();

        let result = store.get("weather:nowhere").await.expect("Get should succeed");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let store = MemoryStore::new();

        store
            .set_with_ttl("weather:paris", r#"{"name":"Paris"}"#, 60)
            .await
            .expect("Set should succeed");

        let value = store.get("weather:paris").await.expect("Get should succeed");
        assert_eq!(value.as_deref(), Some(r#"{"name":"Paris"}"#));
        assert!(store.exists("weather:paris").await.expect("Exists should succeed"));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("weather:oslo", "{}", 1)
            .await
            .expect("Set should succeed");

        tokio::time::sleep(StdDuration::from_secs(2)).await;

        assert!(store.get("weather:oslo").await.expect("Get should succeed").is_none());
        assert!(!store.exists("weather:oslo").await.expect("Exists should succeed"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let store = MemoryStore::new();
        store.set_with_ttl("weather:rome", "first", 60).await.expect("First set");
        store.set_with_ttl("weather:rome", "second", 60).await.expect("Second set");

        let value = store.get("weather:rome").await.expect("Get should succeed");

        assert_eq!(value.as_deref(), Some("second"), "Store should contain latest value");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_reports_removed_count() {
        let store = MemoryStore::new();
        store.set_with_ttl("weather:lima", "{}", 60).await.expect("Set should succeed");

        assert_eq!(store.delete("weather:lima").await.expect("Delete"), 1);
        assert_eq!(store.delete("weather:lima").await.expect("Delete"), 0);
    }

    #[tokio::test]
    async fn test_list_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        store.set_with_ttl("weather:berlin", "{}", 60).await.expect("Set");
        store.set_with_ttl("weather:bern", "{}", 60).await.expect("Set");
        store.set_with_ttl("session:abc", "{}", 60).await.expect("Set");

        let keys = store.list_keys("weather:").await.expect("List should succeed");

        assert_eq!(keys, vec!["weather:berlin".to_string(), "weather:bern".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_many_counts_only_existing_keys() {
        let store = MemoryStore::new();
        store.set_with_ttl("weather:a", "{}", 60).await.expect("Set");
        store.set_with_ttl("weather:b", "{}", 60).await.expect("Set");

        let removed = store
            .delete_many(&[
                "weather:a".to_string(),
                "weather:b".to_string(),
                "weather:c".to_string(),
            ])
            .await
            .expect("Delete should succeed");

        assert_eq!(removed, 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_many_empty_is_zero() {
        let store = MemoryStore::new();

        assert_eq!(store.delete_many(&[]).await.expect("Delete"), 0);
    }

    #[tokio::test]
    async fn test_info_memory_is_human_readable() {
        let store = MemoryStore::new();
        store.set_with_ttl("weather:x", "12345", 60).await.expect("Set");

        let usage = store.info_memory().await.expect("Info should succeed");

        assert_eq!(usage, "14B");
    }

    #[test]
    fn test_human_bytes_units() {
        assert_eq!(human_bytes(0), "0B");
        assert_eq!(human_bytes(1023), "1023B");
        assert_eq!(human_bytes(1024), "1.00K");
        assert_eq!(human_bytes(1536), "1.50K");
        assert_eq!(human_bytes(1024 * 1024), "1.00M");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.00G");
    }
}
