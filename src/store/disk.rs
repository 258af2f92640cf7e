use crate::core::cache::Cache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache persisted in a fjall partition. Keys and entries are stored as JSON,
/// and the expiry is absolute so it holds across restarts.
pub struct DiskCache<K, V> {
    keyspace: Keyspace,
    partition: PartitionHandle,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DiskCache<K, V> {
    pub fn open(path: &Path, partition: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open cache keyspace: {}", path.display()))?;
        let partition = keyspace
            .open_partition(partition, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open cache partition: {partition}"))?;
        Ok(Self {
            keyspace,
            partition,
            _marker: PhantomData,
        })
    }

    fn clear_all(&self) -> Result<()> {
        let keys = self
            .partition
            .keys()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        Ok(())
    }

    /// Flushes the journal so entries survive a crash.
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

impl<K, V> DiskCache<K, V>
where
    K: Serialize + Debug,
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &K) -> Result<Option<V>> {
        let raw_key = serde_json::to_vec(key)?;
        let Some(bytes) = self.partition.get(&raw_key)? else {
            debug!("Cache MISS for key: {:?}", key);
            return Ok(None);
        };
        let entry: CacheEntry<V> = serde_json::from_slice(&bytes)?;
        if entry.expires_at.is_some_and(|at| at <= SystemTime::now()) {
            debug!("Cache entry expired for key: {:?}", key);
            self.partition.remove(raw_key)?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(Some(entry.value))
    }

    fn write(&self, key: &K, value: V, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|d| SystemTime::now() + d),
        };
        self.partition
            .insert(serde_json::to_vec(key)?, serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for DiskCache<K, V>
where
    K: Serialize + Debug + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("DiskCache get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        if let Err(e) = self.write(&key, value, ttl) {
            debug!("DiskCache put error: {}", e);
        }
    }

    async fn remove(&self, key: &K) {
        let res: Result<()> = serde_json::to_vec(key)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Ok(self.partition.remove(raw)?));
        if let Err(e) = res {
            debug!("DiskCache remove error: {}", e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.clear_all() {
            debug!("DiskCache clear error: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_disk_cache_get_put() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        assert!(cache.get(&"USD:EUR".to_string()).await.is_none());

        cache.put("USD:EUR".to_string(), 0.84, None).await;
        assert_eq!(cache.get(&"USD:EUR".to_string()).await, Some(0.84));
        assert!(cache.get(&"USD:ILS".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_ttl_expiration() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        cache
            .put("USD:EUR".to_string(), 0.84, Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(&"USD:EUR".to_string()).await, Some(0.84));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&"USD:EUR".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();
            cache
                .put("USD:ILS".to_string(), 3.3, Some(Duration::from_secs(60)))
                .await;
            cache.persist().unwrap();
        }

        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();
        assert_eq!(cache.get(&"USD:ILS".to_string()).await, Some(3.3));
    }

    #[tokio::test]
    async fn test_disk_cache_remove_and_clear() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        cache.put("USD:EUR".to_string(), 0.84, None).await;
        cache.put("USD:ILS".to_string(), 3.3, None).await;

        cache.remove(&"USD:EUR".to_string()).await;
        assert!(cache.get(&"USD:EUR".to_string()).await.is_none());

        cache.clear().await;
        assert!(cache.get(&"USD:ILS".to_string()).await.is_none());
    }
}
