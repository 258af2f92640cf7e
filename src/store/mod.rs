pub mod disk;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::config::{CacheBackend, CacheConfig};
use anyhow::Result;
use disk::DiskCache;
use memory::MemoryCache;
use std::sync::Arc;
use tracing::info;

const RATES_PARTITION: &str = "rates";

/// Opens the rate cache selected by the configuration.
pub fn open_rate_cache(config: &CacheConfig) -> Result<Arc<dyn Cache<String, f64>>> {
    match config.backend {
        CacheBackend::Memory => {
            info!("Using in-memory rate cache");
            Ok(Arc::new(MemoryCache::<String, f64>::new()))
        }
        CacheBackend::Disk => {
            let path = config.data_path()?;
            info!(path = %path.display(), "Using disk rate cache");
            Ok(Arc::new(DiskCache::<String, f64>::open(
                &path,
                RATES_PARTITION,
            )?))
        }
    }
}
