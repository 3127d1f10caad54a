//! Size-Gated Fetcher
//!
//! Downloads the blob on the path chosen by [`FetchLimits::select_path`] and
//! parses it, bounding the whole download-plus-parse by a single timeout.

use std::io::{self, BufReader};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{FetchLimits, FetchPath};
use crate::error::FetchError;
use crate::models::Property;
use crate::parse;
use crate::storage::BlobStore;

/// Properties parsed from one fetch, with the path that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub properties: Vec<Property>,
    pub path: FetchPath,
}

// == Size-Gated Fetcher ==
/// Fetches and parses the blob under the configured size and time limits.
#[derive(Clone)]
pub struct SizeGatedFetcher {
    store: Arc<dyn BlobStore>,
    limits: FetchLimits,
}

impl SizeGatedFetcher {
    pub fn new(store: Arc<dyn BlobStore>, limits: FetchLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    // == Fetch ==
    /// Downloads and parses a blob whose probed size is `size`.
    ///
    /// Nothing is transferred when `size` exceeds the maximum. On timeout the
    /// in-flight transfer is dropped and any open stream is released.
    pub async fn fetch(&self, size: u64) -> Result<Fetched, FetchError> {
        let path = self.limits.select_path(size)?;
        debug!(size, path = path.as_str(), "Fetching blob");

        let started = Instant::now();
        let properties = tokio::time::timeout(self.limits.timeout, self.fetch_via(path))
            .await
            .map_err(|_| FetchError::Timeout(self.limits.timeout))??;

        info!(
            size,
            path = path.as_str(),
            properties = properties.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched blob"
        );
        Ok(Fetched { properties, path })
    }

    async fn fetch_via(&self, path: FetchPath) -> Result<Vec<Property>, FetchError> {
        match path {
            FetchPath::Direct => self.fetch_direct().await,
            FetchPath::Streaming => self.fetch_streaming().await,
        }
    }

    async fn fetch_direct(&self) -> Result<Vec<Property>, FetchError> {
        // The probe may understate the size, so the cap also applies in transit
        let body = self.store.download(self.limits.max_size_bytes).await?;
        parse::parse_slice(&body)
    }

    async fn fetch_streaming(&self) -> Result<Vec<Property>, FetchError> {
        let cancel = CancellationToken::new();
        // Fires when this future completes or is dropped, ending the stream
        // under the blocking parser so it returns and releases the body.
        let _release = cancel.clone().drop_guard();

        let limit = self.limits.max_size_bytes;
        let mut received = 0u64;
        let body = self
            .store
            .open_stream()
            .await?
            .map(move |chunk| -> io::Result<Bytes> {
                let chunk = chunk?;
                received += chunk.len() as u64;
                if received > limit {
                    return Err(FetchError::SizeLimitExceeded {
                        size: received,
                        limit,
                    }
                    .into());
                }
                Ok(chunk)
            })
            .take_until(cancel.cancelled_owned())
            .boxed();

        let reader = SyncIoBridge::new(StreamReader::new(body));
        let window = self.limits.chunk_size_bytes;

        tokio::task::spawn_blocking(move || {
            parse::parse_reader(BufReader::with_capacity(window, reader))
        })
        .await
        .map_err(|e| FetchError::TransientIo(format!("parser task failed: {}", e)))?
    }
}
