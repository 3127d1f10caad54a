//! Storage Module
//!
//! Access to the remote blob that holds the property document.
//!
//! # Backends
//! - [`HttpBlobStore`] - reads a blob over HTTPS with a SAS-style access token
//! - [`InMemoryBlobStore`] - instrumented in-process blob for tests and local runs

mod http;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::FetchError;

pub use http::{BlobLocation, HttpBlobStore};
pub use memory::{InMemoryBlobStore, StoreMetrics};

/// Incremental blob body. Dropping the stream releases the connection.
pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

// == Blob Store ==
/// Read-only access to a single remote blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the blob's content length without transferring the body.
    async fn probe_size(&self) -> Result<u64, FetchError>;

    /// Downloads the whole body in one call, failing with
    /// `SizeLimitExceeded` as soon as more than `max_bytes` have arrived.
    async fn download(&self, max_bytes: u64) -> Result<Bytes, FetchError>;

    /// Opens the body as a stream of chunks.
    async fn open_stream(&self) -> Result<ByteStream, FetchError>;
}
