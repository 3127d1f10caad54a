//! API Routes
//!
//! Configures the Axum router with all rent roll endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_property_handler, health_handler, invalidate_cache_handler, list_properties_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/properties` - All properties, sorted by name
/// - `GET /api/properties/:id` - One property by id
/// - `DELETE /api/cache` - Invalidate the cached result set
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Blob health probe
///
/// # Middleware
/// - CORS: Allows any origin for the browser frontend
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/properties", get(list_properties_handler))
        .route("/api/properties/:id", get(get_property_handler))
        .route("/api/cache", delete(invalidate_cache_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
