//! Cache Entry Module
//!
//! Defines the single cached result set together with its timing metadata.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::models::ResultSet;

// == Cache Entry ==
/// The cached result set with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored result set
    pub result: Arc<ResultSet>,
    /// Estimated size re-derived when the entry was stored
    pub size_bytes: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stored at `now_ms` that lives for `ttl`.
    pub fn new(result: Arc<ResultSet>, size_bytes: u64, now_ms: u64, ttl: Duration) -> Self {
        Self {
            result,
            size_bytes,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time, so an entry is only
    /// served while its age is strictly below the expiry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    /// Remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
