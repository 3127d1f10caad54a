//! HTTP Blob Store
//!
//! Reads the source blob from object storage with reqwest. The access token is
//! a SAS-style query string appended to the blob URL.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::{header::CONTENT_LENGTH, Client, Response, StatusCode, Url};
use tracing::debug;

use super::{BlobStore, ByteStream};
use crate::error::{ConfigError, FetchError};

// == Blob Location ==
/// A resolved, already-authorized blob address.
#[derive(Clone)]
pub struct BlobLocation {
    url: Url,
}

impl BlobLocation {
    /// Combines the blob URL with its access token.
    ///
    /// Fails if either part is empty or the URL does not parse.
    pub fn new(blob_url: &str, access_token: &str) -> Result<Self, ConfigError> {
        let blob_url = blob_url.trim();
        let token = access_token.trim().trim_start_matches('?');
        if blob_url.is_empty() {
            return Err(ConfigError::Missing("BLOB_URL"));
        }
        if token.is_empty() {
            return Err(ConfigError::Missing("BLOB_ACCESS_TOKEN"));
        }

        let mut url = Url::parse(blob_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, token),
            _ => token.to_string(),
        };
        url.set_query(Some(&query));

        Ok(Self { url })
    }

    /// The blob URL without its token, for logging.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    fn url(&self) -> Url {
        self.url.clone()
    }
}

impl std::fmt::Debug for BlobLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobLocation")
            .field("url", &self.redacted())
            .finish()
    }
}

// == Http Blob Store ==
/// [`BlobStore`] backed by an HTTPS object-storage endpoint.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    location: BlobLocation,
}

impl HttpBlobStore {
    /// Creates a store for `location` with a default client.
    pub fn new(location: BlobLocation) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(client, location))
    }

    /// Creates a store reusing an existing client.
    pub fn with_client(client: Client, location: BlobLocation) -> Self {
        Self { client, location }
    }

    async fn get(&self) -> Result<Response, FetchError> {
        let response = self.client.get(self.location.url()).send().await?;
        check_status(response, &self.location)
    }
}

fn check_status(response: Response, location: &BlobLocation) -> Result<Response, FetchError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(FetchError::NotFound(location.redacted())),
        status if status.is_success() => Ok(response),
        status => Err(FetchError::TransientIo(format!(
            "{} returned HTTP {}",
            location.redacted(),
            status
        ))),
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn probe_size(&self) -> Result<u64, FetchError> {
        let response = self.client.head(self.location.url()).send().await?;
        let response = check_status(response, &self.location)?;

        // HEAD has no body, so the length must come from the header itself
        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| {
                FetchError::TransientIo(format!(
                    "{} did not report a content length",
                    self.location.redacted()
                ))
            })?;

        debug!(blob = %self.location.redacted(), size, "Probed blob size");
        Ok(size)
    }

    async fn download(&self, max_bytes: u64) -> Result<Bytes, FetchError> {
        let mut response = self.get().await?;
        let over_limit = |size: u64| FetchError::SizeLimitExceeded {
            size,
            limit: max_bytes,
        };

        let declared = response.content_length();
        if let Some(size) = declared.filter(|size| *size > max_bytes) {
            return Err(over_limit(size));
        }

        let mut body = BytesMut::with_capacity(declared.unwrap_or(0) as usize);
        while let Some(chunk) = response.chunk().await? {
            let received = (body.len() + chunk.len()) as u64;
            if received > max_bytes {
                return Err(over_limit(received));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    async fn open_stream(&self) -> Result<ByteStream, FetchError> {
        let response = self.get().await?;
        Ok(Box::pin(response.bytes_stream().map_err(FetchError::from)))
    }
}
