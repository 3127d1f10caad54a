//! Error types for the rent roll service
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error Enum ==
/// Failure of one probe, download or parse attempt against the source blob.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The blob does not exist at the configured location
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Network or connectivity failure
    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    /// Download and parse did not finish within the configured bound
    #[error("Download timed out after {0:?}")]
    Timeout(Duration),

    /// The blob is larger than the configured maximum
    #[error("Blob size {size} bytes exceeds maximum of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    /// The blob content is not a valid property document
    #[error("Failed to parse blob: {0}")]
    Parse(String),
}

impl FetchError {
    /// Recovers a `FetchError` that travelled through an `io::Error`,
    /// falling back to `TransientIo` for foreign I/O failures.
    pub fn from_io(err: io::Error) -> Self {
        let message = err.to_string();
        match err.into_inner().map(|inner| inner.downcast::<FetchError>()) {
            Some(Ok(fetch)) => *fetch,
            _ => FetchError::TransientIo(message),
        }
    }
}

impl From<FetchError> for io::Error {
    fn from(err: FetchError) -> Self {
        io::Error::other(err)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::TransientIo(format!("request timed out: {}", err))
        } else if err.is_connect() {
            FetchError::TransientIo(format!("connection error: {}", err))
        } else if err.is_decode() || err.is_body() {
            FetchError::TransientIo(format!("body error: {}", err))
        } else {
            FetchError::TransientIo(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            // I/O failures surfaced by the reader keep their original classification
            FetchError::from_io(err.into())
        } else {
            FetchError::Parse(err.to_string())
        }
    }
}

// == Cache Error Enum ==
/// Errors raised by the result cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The result set does not fit the cache byte budget
    #[error("Result set of {size} bytes exceeds cache budget of {budget} bytes")]
    OverBudget { size: u64, budget: u64 },
}

// == Config Error Enum ==
/// Construction-time configuration failures. These are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// The blob URL could not be parsed
    #[error("Invalid blob URL: {0}")]
    InvalidUrl(String),

    /// Size or time limits are inconsistent
    #[error("Invalid limits: {0}")]
    InvalidLimits(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

// == Api Error Enum ==
/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Property not found
    #[error("Property not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
