//! API Module
//!
//! HTTP handlers and routing for the rent roll REST API.
//!
//! # Endpoints
//! - `GET /api/properties` - List all properties
//! - `GET /api/properties/:id` - Get one property by id
//! - `DELETE /api/cache` - Invalidate the result cache
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
