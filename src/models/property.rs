//! Property domain model
//!
//! The object graph served by the API: Property → Space → RentRoll.
//! Deserialization from the source blob lives in [`crate::parse`].

use std::mem::size_of;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Property ==
/// A building with its leasable spaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub features: Vec<String>,
    pub highlights: Vec<String>,
    pub transportation: Vec<TransportationInfo>,
    pub spaces: Vec<Space>,
}

// == Transportation Info ==
/// A nearby transit option. `distance` is a display string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportationInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub line: Option<String>,
    pub station: Option<String>,
    pub distance: String,
}

// == Space ==
/// A leasable unit inside a property.
///
/// `rent_roll` keeps source order; the last entry is the current rent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub size: Option<u64>,
    pub rent_roll: Vec<RentRoll>,
}

impl Space {
    /// The latest rent roll entry, by position.
    pub fn current_rent(&self) -> Option<&RentRoll> {
        self.rent_roll.last()
    }
}

// == Rent Roll ==
/// Rent charged for a space in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentRoll {
    pub month: String,
    pub year: i32,
    pub rent: f64,
}

// == Data Source ==
/// Where a result set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DataSource {
    /// Downloaded and parsed from the blob
    Live,
    /// Hand-authored substitute served after a failure
    Fallback { reason: FallbackReason },
}

/// Why fallback data was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// Probe, download or parse failed
    SourceUnavailable,
    /// The blob is larger than the configured maximum
    SizeLimitExceeded,
}

impl DataSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataSource::Fallback { .. })
    }
}

// == Result Set ==
/// The full set of properties from one fetch, stored and evicted as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub properties: Vec<Property>,
    pub cached_at: DateTime<Utc>,
    pub estimated_bytes: u64,
    pub source: DataSource,
}

impl ResultSet {
    /// Wraps freshly produced properties, deriving the size estimate.
    pub fn new(properties: Vec<Property>, cached_at: DateTime<Utc>, source: DataSource) -> Self {
        let estimated_bytes = estimate_properties(&properties);
        Self {
            properties,
            cached_at,
            estimated_bytes,
            source,
        }
    }

    /// Properties sorted by name, case-sensitive ascending.
    pub fn sorted_by_name(&self) -> Vec<Property> {
        let mut properties = self.properties.clone();
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        properties
    }

    /// Copy of this result set with properties sorted by name.
    pub fn sorted(&self) -> ResultSet {
        ResultSet {
            properties: self.sorted_by_name(),
            cached_at: self.cached_at,
            estimated_bytes: self.estimated_bytes,
            source: self.source.clone(),
        }
    }

    /// First property whose id matches, ignoring ASCII case.
    pub fn find(&self, id: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.id.eq_ignore_ascii_case(id))
    }
}

// == Size Estimation ==
/// Approximate heap plus inline footprint of a property list.
pub fn estimate_properties(properties: &[Property]) -> u64 {
    properties.iter().map(Property::estimated_bytes).sum()
}

fn string_bytes(value: &str) -> u64 {
    (size_of::<String>() + value.len()) as u64
}

fn optional_bytes(value: &Option<String>) -> u64 {
    value.as_deref().map_or(size_of::<Option<String>>() as u64, string_bytes)
}

impl Property {
    pub fn estimated_bytes(&self) -> u64 {
        size_of::<Property>() as u64
            + string_bytes(&self.id)
            + string_bytes(&self.name)
            + optional_bytes(&self.address)
            + self.features.iter().map(|f| string_bytes(f)).sum::<u64>()
            + self.highlights.iter().map(|h| string_bytes(h)).sum::<u64>()
            + self
                .transportation
                .iter()
                .map(TransportationInfo::estimated_bytes)
                .sum::<u64>()
            + self.spaces.iter().map(Space::estimated_bytes).sum::<u64>()
    }
}

impl TransportationInfo {
    pub fn estimated_bytes(&self) -> u64 {
        size_of::<TransportationInfo>() as u64
            + string_bytes(&self.kind)
            + optional_bytes(&self.line)
            + optional_bytes(&self.station)
            + string_bytes(&self.distance)
    }
}

impl Space {
    pub fn estimated_bytes(&self) -> u64 {
        size_of::<Space>() as u64
            + string_bytes(&self.id)
            + string_bytes(&self.name)
            + optional_bytes(&self.kind)
            + self
                .rent_roll
                .iter()
                .map(|entry| size_of::<RentRoll>() as u64 + string_bytes(&entry.month))
                .sum::<u64>()
    }
}
