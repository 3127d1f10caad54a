//! API Handlers
//!
//! HTTP request handlers for each rent roll endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};
use crate::models::{
    HealthResponse, InvalidateResponse, PropertiesResponse, Property, StatsResponse,
};
use crate::repository::PropertyRepository;

/// Application state shared across all handlers.
///
/// Holds the repository behind an Arc; the repository serializes its own
/// cache access.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<PropertyRepository>,
}

impl AppState {
    /// Creates a new AppState around the given repository.
    pub fn new(repository: PropertyRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails when the blob location is missing or invalid.
    pub fn from_config(config: &Config) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(PropertyRepository::from_config(config)?))
    }
}

/// Handler for GET /api/properties
///
/// Returns all properties sorted by name. Always succeeds; fallback data is
/// marked in the `source` field.
pub async fn list_properties_handler(State(state): State<AppState>) -> Json<PropertiesResponse> {
    Json(state.repository.list_all().await.into())
}

/// Handler for GET /api/properties/:id
///
/// Returns one property by id, matched case-insensitively.
pub async fn get_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>> {
    state
        .repository
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Handler for GET /health
///
/// Probes the blob; 200 when it exists within the size limit, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let report = state.repository.check_health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse::from(&report)))
}

/// Handler for DELETE /api/cache
///
/// Drops the cached result set so the next read refetches the blob.
pub async fn invalidate_cache_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.repository.invalidate_cache().await;
    Json(InvalidateResponse::new(removed))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.repository.cache_stats().await.into())
}
