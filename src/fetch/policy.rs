//! Size-Gating Policy
//!
//! Decides, from the probed blob size alone, whether a download is allowed
//! and whether it is buffered or streamed.

use std::time::Duration;

use crate::config::Config;
use crate::error::FetchError;

// == Fetch Limits ==
/// Size and time bounds applied to one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Blobs above this size are never transferred
    pub max_size_bytes: u64,
    /// Blobs at or below this size are buffered in one call
    pub streaming_threshold_bytes: u64,
    /// Read window on the streaming path
    pub chunk_size_bytes: usize,
    /// Bound on download plus parse
    pub timeout: Duration,
}

impl FetchLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_download_size_bytes,
            streaming_threshold_bytes: config.streaming_threshold_bytes,
            chunk_size_bytes: config.stream_chunk_size_bytes,
            timeout: config.download_timeout(),
        }
    }

    /// Chooses the fetch path for a blob of `size` bytes.
    ///
    /// # Returns
    /// - `Direct` when `size <= streaming_threshold_bytes`
    /// - `Streaming` when `streaming_threshold_bytes < size <= max_size_bytes`
    /// - `SizeLimitExceeded` when `size > max_size_bytes`
    pub fn select_path(&self, size: u64) -> Result<FetchPath, FetchError> {
        if size > self.max_size_bytes {
            Err(FetchError::SizeLimitExceeded {
                size,
                limit: self.max_size_bytes,
            })
        } else if size <= self.streaming_threshold_bytes {
            Ok(FetchPath::Direct)
        } else {
            Ok(FetchPath::Streaming)
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Fetch Path ==
/// How the blob body is transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    /// Whole body buffered in memory
    Direct,
    /// Body read incrementally in bounded chunks
    Streaming,
}

impl FetchPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPath::Direct => "direct",
            FetchPath::Streaming => "streaming",
        }
    }
}
