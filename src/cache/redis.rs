//! Redis-backed cache store
//!
//! Holds a [`redis::Client`] that is opened once at startup without
//! connecting. Every operation obtains a multiplexed connection, so the
//! service keeps running (and reports itself degraded) while Redis is down.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use super::store::{CacheStore, StoreError};

/// Cache store talking to a single Redis database
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    address: String,
}

impl RedisStore {
    /// Creates a store for `redis://{host}:{port}/{db}`
    ///
    /// Only validates the connection parameters; no network traffic happens
    /// until the first command.
    pub fn new(host: &str, port: u16, db: i64) -> Result<Self, StoreError> {
        let address = format!("redis://{}:{}/{}", host, port, db);
        let client = Client::open(address.as_str()).map_err(classify)?;
        Ok(Self { client, address })
    }

    /// The connection URL this store was created with
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(classify)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("address", &self.address)
            .finish()
    }
}

/// Maps a Redis error onto the store taxonomy
fn classify(err: RedisError) -> StoreError {
    if err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_io_error()
        || err.is_timeout()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}

/// Extracts `used_memory_human` from an `INFO memory` reply
pub(crate) fn parse_used_memory_human(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.trim().strip_prefix("used_memory_human:"))
        .map(|value| value.trim().to_string())
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(classify)?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await.map_err(classify)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(key).await.map_err(classify)?;
        Ok(exists)
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await.map_err(classify)?;
        Ok(removed)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn
            .keys(format!("{}*", prefix))
            .await
            .map_err(classify)?;
        Ok(keys)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        // DEL with no arguments is a Redis error
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(keys.to_vec()).await.map_err(classify)?;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn info_memory(&self) -> Result<String, StoreError> {
        let mut conn = self.connection().await?;
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .map_err(classify)?;

        parse_used_memory_human(&info)
            .ok_or_else(|| StoreError::Corrupt("INFO memory lacks used_memory_human".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_MEMORY: &str = "# Memory\r\n\
        used_memory:1081696\r\n\
        used_memory_human:1.03M\r\n\
        used_memory_rss:5296128\r\n\
        used_memory_rss_human:5.05M\r\n";

    #[test]
    fn test_parse_used_memory_human() {
        assert_eq!(
            parse_used_memory_human(INFO_MEMORY),
            Some("1.03M".to_string())
        );
    }

    #[test]
    fn test_parse_used_memory_human_missing_field() {
        assert_eq!(parse_used_memory_human("# Memory\r\nused_memory:1\r\n"), None);
    }

    #[test]
    fn test_new_builds_address_without_connecting() {
        // Nothing listens on this port; creating the store must still succeed
        let store = RedisStore::new("127.0.0.1", 1, 3).expect("Client should open");
        assert_eq!(store.address(), "redis://127.0.0.1:1/3");
    }

    #[tokio::test]
    async fn test_ping_unreachable_server_is_unavailable() {
        let store = RedisStore::new("127.0.0.1", 1, 0).expect("Client should open");

        let err = store.ping().await.expect_err("Ping should fail");

        assert!(err.is_unavailable(), "Expected Unavailable, got {:?}", err);
    }

    #[tokio::test]
    async fn test_delete_many_empty_skips_the_server() {
        let store = RedisStore::new("127.0.0.1", 1, 0).expect("Client should open");

        let removed = store.delete_many(&[]).await.expect("Empty delete should not connect");

        assert_eq!(removed, 0);
    }
}
