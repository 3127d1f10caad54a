//! Response DTOs for the rent roll API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{DataSource, Property, ResultSet};
use crate::repository::HealthReport;

/// Response body for GET /api/properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesResponse {
    /// Properties sorted by name
    pub properties: Vec<Property>,
    /// Number of properties returned
    pub count: usize,
    /// Whether the data is live or fallback
    pub source: DataSource,
    /// When the result set was produced
    pub cached_at: DateTime<Utc>,
}

impl From<ResultSet> for PropertiesResponse {
    fn from(set: ResultSet) -> Self {
        Self {
            count: set.properties.len(),
            properties: set.properties,
            source: set.source,
            cached_at: set.cached_at,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub declined: u64,
    pub invalidations: u64,
    pub populated: bool,
    pub entry_bytes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            declined: stats.declined,
            invalidations: stats.invalidations,
            populated: stats.populated,
            entry_bytes: stats.entry_bytes,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Probed blob size, when the probe succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_size_bytes: Option<u64>,
    /// Why the service is unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl From<&HealthReport> for HealthResponse {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: if report.is_healthy() {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            blob_size_bytes: report.blob_size_bytes,
            reason: report.error.as_ref().map(|err| err.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for DELETE /api/cache
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// Whether a cached result set was dropped
    pub removed: bool,
}

impl InvalidateResponse {
    pub fn new(removed: bool) -> Self {
        let message = if removed {
            "Cache invalidated".to_string()
        } else {
            "Cache was already empty".to_string()
        };
        Self { message, removed }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
