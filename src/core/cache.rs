//! Key-value cache abstraction with per-entry expiry

use async_trait::async_trait;
use std::time::Duration;

/// An async cache where every entry may carry its own time to live.
///
/// Expired entries behave exactly like missing ones.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    async fn get(&self, key: &K) -> Option<V>;
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
    async fn remove(&self, key: &K);
    async fn clear(&self);
}
