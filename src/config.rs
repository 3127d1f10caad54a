//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

// == Defaults ==
const MIB: u64 = 1024 * 1024;

/// Default maximum blob size accepted for download (200 MiB)
pub const DEFAULT_MAX_DOWNLOAD_SIZE_BYTES: u64 = 200 * MIB;
/// Default size above which the blob is streamed instead of buffered (10 MiB)
pub const DEFAULT_STREAMING_THRESHOLD_BYTES: u64 = 10 * MIB;
/// Default read window for the streaming path (64 KiB)
pub const DEFAULT_STREAM_CHUNK_SIZE_BYTES: usize = 64 * 1024;
/// Default bound on download plus parse (10 minutes)
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;
/// Default age after which the cached result set is stale (30 minutes)
pub const DEFAULT_CACHE_EXPIRY_SECS: u64 = 1800;
/// Default byte budget for the cached result set (100 MiB)
pub const DEFAULT_CACHE_BYTE_BUDGET: u64 = 100 * MIB;

/// Service configuration parameters.
///
/// All values can be configured via environment variables. Limits fall back
/// to sensible defaults; the blob location has none and must be provided.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the source JSON blob
    pub blob_url: String,
    /// Short-lived access token (SAS query string) for the blob
    pub blob_access_token: String,
    /// Largest blob that will be downloaded at all
    pub max_download_size_bytes: u64,
    /// Blobs larger than this are streamed instead of buffered
    pub streaming_threshold_bytes: u64,
    /// Read window used on the streaming path
    pub stream_chunk_size_bytes: usize,
    /// Bound on download plus parse, in seconds
    pub download_timeout_secs: u64,
    /// Age in seconds after which the cached result set is stale
    pub cache_expiry_secs: u64,
    /// Largest result set the cache will hold, in estimated bytes
    pub cache_byte_budget: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BLOB_URL` - Source blob URL (required)
    /// - `BLOB_ACCESS_TOKEN` - Blob access token (required)
    /// - `MAX_DOWNLOAD_SIZE_BYTES` - Maximum blob size (default: 200 MiB)
    /// - `STREAMING_THRESHOLD_BYTES` - Streaming threshold (default: 10 MiB)
    /// - `STREAM_CHUNK_SIZE_BYTES` - Streaming read window (default: 64 KiB)
    /// - `DOWNLOAD_TIMEOUT_SECS` - Download timeout (default: 600)
    /// - `CACHE_EXPIRY_SECS` - Cache expiry (default: 1800)
    /// - `CACHE_BYTE_BUDGET` - Cache byte budget (default: 100 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            blob_url: env::var("BLOB_URL").unwrap_or_default(),
            blob_access_token: env::var("BLOB_ACCESS_TOKEN").unwrap_or_default(),
            max_download_size_bytes: parse_env(
                "MAX_DOWNLOAD_SIZE_BYTES",
                defaults.max_download_size_bytes,
            ),
            streaming_threshold_bytes: parse_env(
                "STREAMING_THRESHOLD_BYTES",
                defaults.streaming_threshold_bytes,
            ),
            stream_chunk_size_bytes: parse_env(
                "STREAM_CHUNK_SIZE_BYTES",
                defaults.stream_chunk_size_bytes,
            ),
            download_timeout_secs: parse_env(
                "DOWNLOAD_TIMEOUT_SECS",
                defaults.download_timeout_secs,
            ),
            cache_expiry_secs: parse_env("CACHE_EXPIRY_SECS", defaults.cache_expiry_secs),
            cache_byte_budget: parse_env("CACHE_BYTE_BUDGET", defaults.cache_byte_budget),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
        }
    }

    /// Checks that the blob location is present and the limits are coherent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blob_url.trim().is_empty() {
            return Err(ConfigError::Missing("BLOB_URL"));
        }
        if self.blob_access_token.trim().is_empty() {
            return Err(ConfigError::Missing("BLOB_ACCESS_TOKEN"));
        }
        if self.streaming_threshold_bytes > self.max_download_size_bytes {
            return Err(ConfigError::InvalidLimits(format!(
                "streaming threshold {} exceeds maximum download size {}",
                self.streaming_threshold_bytes, self.max_download_size_bytes
            )));
        }
        if self.stream_chunk_size_bytes == 0 {
            return Err(ConfigError::InvalidLimits(
                "stream chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Bound on download plus parse.
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Age after which the cached result set is stale.
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blob_url: String::new(),
            blob_access_token: String::new(),
            max_download_size_bytes: DEFAULT_MAX_DOWNLOAD_SIZE_BYTES,
            streaming_threshold_bytes: DEFAULT_STREAMING_THRESHOLD_BYTES,
            stream_chunk_size_bytes: DEFAULT_STREAM_CHUNK_SIZE_BYTES,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            cache_expiry_secs: DEFAULT_CACHE_EXPIRY_SECS,
            cache_byte_budget: DEFAULT_CACHE_BYTE_BUDGET,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located() -> Config {
        Config {
            blob_url: "https://example.blob.core.windows.net/data/properties.json".to_string(),
            blob_access_token: "sv=2024&sig=abc".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_download_size_bytes, 200 * 1024 * 1024);
        assert_eq!(config.streaming_threshold_bytes, 10 * 1024 * 1024);
        assert_eq!(config.stream_chunk_size_bytes, 64 * 1024);
        assert_eq!(config.download_timeout(), Duration::from_secs(600));
        assert_eq!(config.cache_expiry(), Duration::from_secs(1800));
        assert_eq!(config.cache_byte_budget, 100 * 1024 * 1024);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_validate_requires_blob_location() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("BLOB_URL"))
        ));

        let config = Config {
            blob_access_token: "   ".to_string(),
            ..located()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("BLOB_ACCESS_TOKEN"))
        ));
    }

    #[test]
    fn test_validate_rejects_threshold_above_maximum() {
        let config = Config {
            streaming_threshold_bytes: 300,
            max_download_size_bytes: 200,
            ..located()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimits(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = Config {
            stream_chunk_size_bytes: 0,
            ..located()
        };
        assert!(config.validate().is_err());
        assert!(located().validate().is_ok());
    }
}
