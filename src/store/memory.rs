use crate::core::cache::Cache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local cache; entries vanish with the process.
pub struct MemoryCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> MemoryCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                debug!("Cache HIT for key: {:?}", key);
                return Some(entry.value.clone());
            }
            Some(_) => debug!("Cache entry expired for key: {:?}", key),
            None => {
                debug!("Cache MISS for key: {:?}", key);
                return None;
            }
        }
        entries.remove(key);
        None
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let mut entries = self.entries.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        entries.insert(key, Entry { value, expires_at });
    }

    async fn remove(&self, key: &K) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        debug!("Cache REMOVE for key: {:?}", key);
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
        debug!("Cache CLEAR");
    }
}
