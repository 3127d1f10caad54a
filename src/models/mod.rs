//! Domain and response models for the rent roll service
//!
//! The property graph served by the API, and the DTOs used to
//! serialize HTTP response bodies.

pub mod property;
pub mod responses;

// Re-export commonly used types
pub use property::{
    estimate_properties, DataSource, FallbackReason, Property, RentRoll, ResultSet, Space,
    TransportationInfo,
};
pub use responses::{
    ErrorResponse, HealthResponse, InvalidateResponse, PropertiesResponse, StatsResponse,
};
