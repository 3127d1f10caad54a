//! Cache Statistics Module
//!
//! Tracks cache performance metrics for the result-set slot.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups served from the slot
    pub hits: u64,
    /// Number of lookups that found the slot empty or expired
    pub misses: u64,
    /// Number of result sets stored
    pub stores: u64,
    /// Number of result sets refused for exceeding the byte budget
    pub declined: u64,
    /// Number of explicit invalidations
    pub invalidations: u64,
    /// Whether the slot currently holds a result set
    pub populated: bool,
    /// Estimated size of the held result set
    pub entry_bytes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_store(&mut self) {
        self.stores += 1;
    }

    pub fn record_declined(&mut self) {
        self.declined += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    // == Update Slot ==
    /// Updates the slot occupancy fields.
    pub fn set_slot(&mut self, entry_bytes: Option<u64>) {
        self.populated = entry_bytes.is_some();
        self.entry_bytes = entry_bytes.unwrap_or(0);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.stores, 0);
        assert!(!stats.populated);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_set_slot() {
        let mut stats = CacheStats::new();
        stats.set_slot(Some(512));
        assert!(stats.populated);
        assert_eq!(stats.entry_bytes, 512);

        stats.set_slot(None);
        assert!(!stats.populated);
        assert_eq!(stats.entry_bytes, 0);
    }
}
