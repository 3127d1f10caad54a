//! Repository Module
//!
//! The facade handlers talk to. Serves the property list from the result
//! cache, refreshing it from the blob on a miss and substituting fallback
//! data when the blob cannot be read.
//!
//! # Pipeline
//! cache hit → return; miss → probe size → size-gated fetch and parse →
//! store in cache → return. Any failure on the way yields fallback data,
//! which is never cached.

mod fallback;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, Clock, ResultCache, SystemClock};
use crate::config::Config;
use crate::error::{ConfigError, FetchError};
use crate::fetch::{FetchLimits, SizeGatedFetcher};
use crate::models::{DataSource, FallbackReason, Property, ResultSet};
use crate::storage::{BlobLocation, BlobStore, HttpBlobStore};

pub use fallback::fallback_properties;

// == Health Report ==
/// Outcome of a size probe against the blob.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    /// Probed size, when the probe succeeded
    pub blob_size_bytes: Option<u64>,
    /// Why the blob is not servable; `SizeLimitExceeded` points at configuration
    pub error: Option<FetchError>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

// == Property Repository ==
/// Cached, fault-tolerant access to the property list.
pub struct PropertyRepository {
    store: Arc<dyn BlobStore>,
    fetcher: SizeGatedFetcher,
    cache: RwLock<ResultCache>,
    clock: Arc<dyn Clock>,
}

impl PropertyRepository {
    // == Constructor ==
    /// Assembles a repository from its collaborators.
    ///
    /// # Arguments
    /// * `store` - Source of the blob
    /// * `cache` - Result cache, owned by the repository from here on
    /// * `limits` - Size and time limits for fetching
    /// * `clock` - Time source for result set timestamps
    pub fn new(
        store: Arc<dyn BlobStore>,
        cache: ResultCache,
        limits: FetchLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher: SizeGatedFetcher::new(Arc::clone(&store), limits),
            store,
            cache: RwLock::new(cache),
            clock,
        }
    }

    /// Builds a repository reading the blob over HTTP.
    ///
    /// Fails if the blob location is missing or the limits are inconsistent;
    /// without a blob there is nothing to serve.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let location = BlobLocation::new(&config.blob_url, &config.blob_access_token)?;
        info!(blob = %location.redacted(), "Using blob source");

        let store = Arc::new(HttpBlobStore::new(location)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = ResultCache::with_clock(
            config.cache_expiry(),
            config.cache_byte_budget,
            Arc::clone(&clock),
        );
        Ok(Self::new(store, cache, FetchLimits::from_config(config), clock))
    }

    // == List All ==
    /// Returns every property, sorted by name.
    ///
    /// Never fails: on any fetch error the fallback dataset is returned with
    /// its `source` saying why.
    pub async fn list_all(&self) -> ResultSet {
        self.current().await.sorted()
    }

    // == Get By Id ==
    /// Returns the first property in [`list_all`](Self::list_all) order whose
    /// id matches `id`, ignoring case.
    pub async fn get_by_id(&self, id: &str) -> Option<Property> {
        self.list_all().await.find(id).cloned()
    }

    // == Check Health ==
    /// Probes the blob without downloading it or touching the cache.
    pub async fn check_health(&self) -> HealthReport {
        let limit = self.fetcher.limits().max_size_bytes;
        match self.store.probe_size().await {
            Ok(size) if size > limit => HealthReport {
                blob_size_bytes: Some(size),
                error: Some(FetchError::SizeLimitExceeded { size, limit }),
            },
            Ok(size) => HealthReport {
                blob_size_bytes: Some(size),
                error: None,
            },
            Err(err) => HealthReport {
                blob_size_bytes: None,
                error: Some(err),
            },
        }
    }

    // == Invalidate ==
    /// Drops the cached result set. Returns true if one was held.
    pub async fn invalidate_cache(&self) -> bool {
        let removed = self.cache.write().await.invalidate();
        info!(removed, "Result cache invalidated");
        removed
    }

    /// Returns current cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// The cached result set, or a freshly loaded one, or fallback data.
    async fn current(&self) -> Arc<ResultSet> {
        // Write lock: an expired entry is removed during the lookup
        if let Some(cached) = self.cache.write().await.get() {
            return cached;
        }

        match self.load().await {
            Ok(properties) => {
                let set = Arc::new(ResultSet::new(properties, self.clock.now(), DataSource::Live));
                if let Err(err) = self.cache.write().await.put(Arc::clone(&set)) {
                    warn!(error = %err, "Serving result set without caching it");
                }
                set
            }
            Err(FetchError::SizeLimitExceeded { size, limit }) => {
                error!(
                    size,
                    limit, "Blob exceeds maximum download size; serving fallback data"
                );
                Arc::new(self.fallback(FallbackReason::SizeLimitExceeded))
            }
            Err(err) => {
                warn!(error = %err, "Blob unavailable; serving fallback data");
                Arc::new(self.fallback(FallbackReason::SourceUnavailable))
            }
        }
    }

    async fn load(&self) -> Result<Vec<Property>, FetchError> {
        debug!("Probing blob size");
        let size = self.store.probe_size().await?;
        let fetched = self.fetcher.fetch(size).await?;
        Ok(fetched.properties)
    }

    fn fallback(&self, reason: FallbackReason) -> ResultSet {
        ResultSet::new(
            fallback_properties(),
            self.clock.now(),
            DataSource::Fallback { reason },
        )
    }
}
