//! Cache Module
//!
//! Single-slot cache for the most recent result set, with time-based expiry
//! and a byte budget.

mod clock;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::ResultCache;

// == Public Constants ==
/// Key of the one cached dataset, used in logs
pub const RESULT_SET_KEY: &str = "properties";
