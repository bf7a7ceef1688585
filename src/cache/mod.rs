//! Cache stores for upstream weather responses
//!
//! This module defines the [`CacheStore`] trait: a string key-value store with
//! per-key TTL, plus prefix listing and bulk deletion for cache
//! administration. [`RedisStore`] is the production backend; [`MemoryStore`]
//! keeps everything in process and is what the tests run against.

mod memory;
mod redis;
mod store;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::store::{CacheStore, StoreError};
