//! Fetch Module
//!
//! Size-gated download of the source blob: the policy that picks a path and
//! the fetcher that runs it under a timeout.

mod fetcher;
mod policy;

#[cfg(test)]
mod property_tests;

pub use fetcher::{Fetched, SizeGatedFetcher};
pub use policy::{FetchLimits, FetchPath};
