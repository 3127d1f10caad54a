//! Result Cache Module
//!
//! Single-slot cache engine: holds the latest result set until it expires,
//! is invalidated, or is replaced. Callers serialize access through one lock.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, RESULT_SET_KEY};
use crate::error::CacheError;
use crate::models::{estimate_properties, ResultSet};

// == Result Cache ==
/// Single-entry cache for the full property result set.
#[derive(Debug)]
pub struct ResultCache {
    /// The one cached entry
    slot: Option<CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Age at which the entry stops being served
    expiry: Duration,
    /// Largest estimated result set that will be stored
    byte_budget: u64,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    // == Constructor ==
    /// Creates an empty cache using wall-clock time.
    ///
    /// # Arguments
    /// * `expiry` - Age at which the stored result set becomes a miss
    /// * `byte_budget` - Largest estimated result set the cache will hold
    pub fn new(expiry: Duration, byte_budget: u64) -> Self {
        Self::with_clock(expiry, byte_budget, Arc::new(SystemClock))
    }

    /// Creates an empty cache reading time from `clock`.
    pub fn with_clock(expiry: Duration, byte_budget: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: None,
            stats: CacheStats::new(),
            expiry,
            byte_budget,
            clock,
        }
    }

    // == Get ==
    /// Returns the cached result set if present and younger than the expiry.
    ///
    /// An expired entry is dropped and counted as a miss.
    pub fn get(&mut self) -> Option<Arc<ResultSet>> {
        let now = self.clock.now_ms();
        match &self.slot {
            Some(entry) if entry.is_expired(now) => {
                debug!(
                    key = RESULT_SET_KEY,
                    age_ms = entry.age_ms(now),
                    "Cached result set expired"
                );
                self.slot = None;
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                debug!(
                    key = RESULT_SET_KEY,
                    ttl_remaining_ms = entry.ttl_remaining_ms(now),
                    "Serving cached result set"
                );
                self.stats.record_hit();
                Some(Arc::clone(&entry.result))
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `result`, replacing any previous entry, with a fresh timestamp.
    ///
    /// The size estimate is re-derived from the contents. A result set over
    /// the byte budget is refused whole and the slot is left empty.
    pub fn put(&mut self, result: Arc<ResultSet>) -> Result<(), CacheError> {
        let size = estimate_properties(&result.properties);
        if size > self.byte_budget {
            warn!(
                key = RESULT_SET_KEY,
                size,
                budget = self.byte_budget,
                "Result set exceeds cache budget; not caching"
            );
            self.slot = None;
            self.stats.record_declined();
            return Err(CacheError::OverBudget {
                size,
                budget: self.byte_budget,
            });
        }

        let now = self.clock.now_ms();
        self.slot = Some(CacheEntry::new(result, size, now, self.expiry));
        self.stats.record_store();
        debug!(key = RESULT_SET_KEY, size, "Cached result set");
        Ok(())
    }

    // == Invalidate ==
    /// Clears the slot unconditionally.
    ///
    /// Returns true if an entry was removed.
    pub fn invalidate(&mut self) -> bool {
        self.stats.record_invalidation();
        self.slot.take().is_some()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_slot(self.slot.as_ref().map(|entry| entry.size_bytes));
        stats
    }

    /// Returns true if the slot holds an entry, expired or not.
    pub fn is_populated(&self) -> bool {
        self.slot.is_some()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::models::{DataSource, Property};

    const EXPIRY: Duration = Duration::from_secs(30 * 60);

    fn result_set(names: &[&str]) -> Arc<ResultSet> {
        let properties = names
            .iter()
            .enumerate()
            .map(|(i, name)| Property {
                id: format!("P{}", i),
                name: name.to_string(),
                address: None,
                features: vec![],
                highlights: vec![],
                transportation: vec![],
                spaces: vec![],
            })
            .collect();
        Arc::new(ResultSet::new(properties, chrono::Utc::now(), DataSource::Live))
    }

    fn cache_with_clock() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(1_000_000));
        let cache = ResultCache::with_clock(EXPIRY, 1024 * 1024, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_empty_cache_misses() {
        let (mut cache, _) = cache_with_clock();

        assert!(cache.get().is_none());
        assert_eq!(cache.stats().misses, 1);
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_put_then_get() {
        let (mut cache, _) = cache_with_clock();
        let set = result_set(&["A"]);

        cache.put(set.clone()).unwrap();
        let cached = cache.get().unwrap();

        assert!(Arc::ptr_eq(&cached, &set));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stores, 1);
        assert!(stats.populated);
        assert_eq!(stats.entry_bytes, set.estimated_bytes);
    }

    #[test]
    fn test_entry_expires_after_expiry() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(result_set(&["A"])).unwrap();

        clock.advance(EXPIRY - Duration::from_millis(1));
        assert!(cache.get().is_some());

        clock.advance(Duration::from_millis(1));
        assert!(cache.get().is_none());
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_put_replaces_and_refreshes_timestamp() {
        let (mut cache, clock) = cache_with_clock();
        cache.put(result_set(&["Old"])).unwrap();

        clock.advance(EXPIRY - Duration::from_secs(1));
        cache.put(result_set(&["New"])).unwrap();
        clock.advance(Duration::from_secs(10));

        let cached = cache.get().unwrap();
        assert_eq!(cached.properties[0].name, "New");
    }

    #[test]
    fn test_invalidate_clears_slot() {
        let (mut cache, _) = cache_with_clock();
        cache.put(result_set(&["A"])).unwrap();

        assert!(cache.invalidate());
        assert!(cache.get().is_none());
        assert!(!cache.invalidate());
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_over_budget_is_declined() {
        let clock = Arc::new(ManualClock::new());
        let mut cache = ResultCache::with_clock(EXPIRY, 16, clock);
        cache.put(Arc::new(ResultSet::new(vec![], chrono::Utc::now(), DataSource::Live)))
            .unwrap();

        let err = cache.put(result_set(&["Too big"])).unwrap_err();

        assert!(matches!(err, CacheError::OverBudget { budget: 16, .. }));
        assert!(!cache.is_populated());
        assert_eq!(cache.stats().declined, 1);
    }
}
