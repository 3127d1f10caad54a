//! In-Memory Blob Store
//!
//! A [`BlobStore`] over a byte buffer that records every call it serves.
//! Used by the test suites and for running the service without object storage.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use super::{BlobStore, ByteStream};
use crate::config::DEFAULT_STREAM_CHUNK_SIZE_BYTES;
use crate::error::FetchError;

// == Store Metrics ==
/// Call counters and memory gauges for an [`InMemoryBlobStore`].
#[derive(Debug, Default)]
pub struct StoreMetrics {
    probes: AtomicUsize,
    downloads: AtomicUsize,
    streams_opened: AtomicUsize,
    open_streams: AtomicUsize,
    bytes_served: AtomicU64,
    live_chunk_bytes: AtomicU64,
    peak_live_chunk_bytes: AtomicU64,
}

impl StoreMetrics {
    /// Number of size probes served.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of whole-body downloads served.
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of streams opened.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Downloads plus streams: every call that transfers the body.
    pub fn fetches(&self) -> usize {
        self.downloads() + self.streams_opened()
    }

    /// Streams opened and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Total body bytes handed out on either path.
    pub fn bytes_served(&self) -> u64 {
        self.bytes_served.load(Ordering::SeqCst)
    }

    /// Streamed chunk bytes currently alive.
    pub fn live_chunk_bytes(&self) -> u64 {
        self.live_chunk_bytes.load(Ordering::SeqCst)
    }

    /// Most streamed chunk bytes alive at the same time.
    pub fn peak_live_chunk_bytes(&self) -> u64 {
        self.peak_live_chunk_bytes.load(Ordering::SeqCst)
    }

    fn chunk_created(&self, len: u64) {
        let live = self.live_chunk_bytes.fetch_add(len, Ordering::SeqCst) + len;
        self.peak_live_chunk_bytes.fetch_max(live, Ordering::SeqCst);
        self.bytes_served.fetch_add(len, Ordering::SeqCst);
    }

    fn chunk_dropped(&self, len: u64) {
        self.live_chunk_bytes.fetch_sub(len, Ordering::SeqCst);
    }
}

/// A streamed chunk that reports its own release to the metrics.
struct TrackedChunk {
    data: Bytes,
    metrics: Arc<StoreMetrics>,
}

impl AsRef<[u8]> for TrackedChunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for TrackedChunk {
    fn drop(&mut self) {
        self.metrics.chunk_dropped(self.data.len() as u64);
    }
}

/// Held by a stream for its lifetime.
struct OpenStreamGuard(Arc<StoreMetrics>);

impl OpenStreamGuard {
    fn new(metrics: Arc<StoreMetrics>) -> Self {
        metrics.streams_opened.fetch_add(1, Ordering::SeqCst);
        metrics.open_streams.fetch_add(1, Ordering::SeqCst);
        Self(metrics)
    }
}

impl Drop for OpenStreamGuard {
    fn drop(&mut self) {
        self.0.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Store State ==
#[derive(Debug, Clone)]
struct StoreState {
    content: Bytes,
    reported_size: Option<u64>,
    probe_failure: Option<FetchError>,
    fetch_failure: Option<FetchError>,
    stream_failure: Option<(usize, FetchError)>,
}

// == In-Memory Blob Store ==
/// [`BlobStore`] serving a fixed buffer, with failure and latency injection.
#[derive(Debug)]
pub struct InMemoryBlobStore {
    state: Mutex<StoreState>,
    chunk_size: usize,
    delay: Duration,
    metrics: Arc<StoreMetrics>,
}

impl InMemoryBlobStore {
    /// Creates a store serving `content`.
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                content: content.into(),
                reported_size: None,
                probe_failure: None,
                fetch_failure: None,
                stream_failure: None,
            }),
            chunk_size: DEFAULT_STREAM_CHUNK_SIZE_BYTES,
            delay: Duration::ZERO,
            metrics: Arc::new(StoreMetrics::default()),
        }
    }

    /// Sets the size of each streamed chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Makes the probe report `size` instead of the real content length.
    pub fn with_reported_size(self, size: u64) -> Self {
        self.lock().reported_size = Some(size);
        self
    }

    /// Delays each download and each streamed chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every probe fail with `err`.
    pub fn with_probe_failure(self, err: FetchError) -> Self {
        self.lock().probe_failure = Some(err);
        self
    }

    /// Makes streams fail with `err` after `chunks` chunks.
    pub fn with_stream_failure_after(self, chunks: usize, err: FetchError) -> Self {
        self.lock().stream_failure = Some((chunks, err));
        self
    }

    /// Replaces the served content.
    pub fn set_content(&self, content: impl Into<Bytes>) {
        self.lock().content = content.into();
    }

    /// Makes downloads and streams fail with `err`, or succeed again with `None`.
    pub fn set_fetch_failure(&self, err: Option<FetchError>) {
        self.lock().fetch_failure = err;
    }

    /// Shared handle to the call counters.
    pub fn metrics(&self) -> Arc<StoreMetrics> {
        Arc::clone(&self.metrics)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn probe_size(&self) -> Result<u64, FetchError> {
        self.metrics.probes.fetch_add(1, Ordering::SeqCst);
        let state = self.snapshot();
        if let Some(err) = state.probe_failure {
            return Err(err);
        }
        Ok(state
            .reported_size
            .unwrap_or(state.content.len() as u64))
    }

    async fn download(&self, max_bytes: u64) -> Result<Bytes, FetchError> {
        self.metrics.downloads.fetch_add(1, Ordering::SeqCst);
        let state = self.snapshot();
        if let Some(err) = state.fetch_failure {
            return Err(err);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let size = state.content.len() as u64;
        if size > max_bytes {
            // Only the bytes up to the cap would have crossed the wire
            self.metrics.bytes_served.fetch_add(max_bytes, Ordering::SeqCst);
            return Err(FetchError::SizeLimitExceeded {
                size,
                limit: max_bytes,
            });
        }
        self.metrics.bytes_served.fetch_add(size, Ordering::SeqCst);
        Ok(state.content)
    }

    async fn open_stream(&self) -> Result<ByteStream, FetchError> {
        let state = self.snapshot();
        if let Some(err) = state.fetch_failure {
            self.metrics.streams_opened.fetch_add(1, Ordering::SeqCst);
            return Err(err);
        }

        struct Cursor {
            content: Bytes,
            offset: usize,
            emitted: usize,
            chunk_size: usize,
            delay: Duration,
            failure: Option<(usize, FetchError)>,
            metrics: Arc<StoreMetrics>,
            _guard: OpenStreamGuard,
        }

        let cursor = Cursor {
            content: state.content,
            offset: 0,
            emitted: 0,
            chunk_size: self.chunk_size,
            delay: self.delay,
            failure: state.stream_failure,
            metrics: Arc::clone(&self.metrics),
            _guard: OpenStreamGuard::new(Arc::clone(&self.metrics)),
        };

        let chunks = stream::unfold(cursor, |mut cursor| async move {
            if !cursor.delay.is_zero() {
                tokio::time::sleep(cursor.delay).await;
            }
            if let Some((after, err)) = &cursor.failure {
                if cursor.emitted >= *after {
                    let err = err.clone();
                    cursor.failure = None;
                    cursor.offset = cursor.content.len();
                    return Some((Err(err), cursor));
                }
            }
            if cursor.offset >= cursor.content.len() {
                return None;
            }

            let end = (cursor.offset + cursor.chunk_size).min(cursor.content.len());
            // Copy so each chunk owns its memory and the gauge reflects it
            let data = Bytes::copy_from_slice(&cursor.content[cursor.offset..end]);
            cursor.metrics.chunk_created(data.len() as u64);
            let chunk = Bytes::from_owner(TrackedChunk {
                data,
                metrics: Arc::clone(&cursor.metrics),
            });
            cursor.offset = end;
            cursor.emitted += 1;
            Some((Ok(chunk), cursor))
        });

        Ok(Box::pin(chunks))
    }
}
