//! Rent Roll Service - property and rent roll API over a cached blob
//!
//! Downloads a JSON property document from object storage, buffering or
//! streaming it depending on size, caches the parsed result, and falls back
//! to a fixed dataset when the blob cannot be read.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parse;
pub mod repository;
pub mod storage;

pub use api::AppState;
pub use config::Config;
pub use repository::PropertyRepository;
