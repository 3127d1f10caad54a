//! Blob Deserializer
//!
//! Parses the source JSON document into the property graph. Field names are
//! matched case-insensitively against a static alias table per entity, unknown
//! fields are skipped, and optional fields take their documented defaults.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::marker::PhantomData;

use chrono::{Datelike, Utc};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use tracing::warn;

use crate::error::FetchError;
use crate::models::{Property, RentRoll, Space, TransportationInfo};

// == Entry Points ==
/// Parses a fully buffered blob.
pub fn parse_slice(bytes: &[u8]) -> Result<Vec<Property>, FetchError> {
    let properties: Vec<Property> = serde_json::from_slice(bytes)?;
    report_duplicate_ids(&properties);
    Ok(properties)
}

/// Parses a blob from a synchronous reader, pulling input as needed.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Property>, FetchError> {
    let properties: Vec<Property> = serde_json::from_reader(reader)?;
    report_duplicate_ids(&properties);
    Ok(properties)
}

/// Duplicate ids are kept; lookups return the first match in name order.
fn report_duplicate_ids(properties: &[Property]) {
    let mut seen = HashSet::with_capacity(properties.len());
    for property in properties {
        if !seen.insert(property.id.to_ascii_lowercase()) {
            warn!(property_id = %property.id, "Duplicate property id in blob");
        }
    }
}

// == Alias Tables ==
type AliasTable<F> = &'static [(&'static str, F)];

fn resolve<F: Copy>(key: &str, table: AliasTable<F>) -> Option<F> {
    table
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(key))
        .map(|(_, field)| *field)
}

#[derive(Clone, Copy)]
enum PropertyField {
    Id,
    Name,
    Address,
    Features,
    Highlights,
    Transportation,
    Spaces,
}

const PROPERTY_FIELDS: AliasTable<PropertyField> = &[
    ("PropertyId", PropertyField::Id),
    ("Id", PropertyField::Id),
    ("PropertyName", PropertyField::Name),
    ("Name", PropertyField::Name),
    ("Address", PropertyField::Address),
    ("Features", PropertyField::Features),
    ("Highlights", PropertyField::Highlights),
    ("Transportation", PropertyField::Transportation),
    ("Spaces", PropertyField::Spaces),
];

#[derive(Clone, Copy)]
enum TransportationField {
    Kind,
    Line,
    Station,
    Distance,
}

const TRANSPORTATION_FIELDS: AliasTable<TransportationField> = &[
    ("Type", TransportationField::Kind),
    ("Line", TransportationField::Line),
    ("Station", TransportationField::Station),
    ("Distance", TransportationField::Distance),
];

#[derive(Clone, Copy)]
enum SpaceField {
    Id,
    Name,
    Kind,
    Size,
    RentRoll,
}

const SPACE_FIELDS: AliasTable<SpaceField> = &[
    ("SpaceId", SpaceField::Id),
    ("Id", SpaceField::Id),
    ("SpaceName", SpaceField::Name),
    ("Name", SpaceField::Name),
    ("Type", SpaceField::Kind),
    ("SpaceType", SpaceField::Kind),
    ("Size", SpaceField::Size),
    ("RentRoll", SpaceField::RentRoll),
];

#[derive(Clone, Copy)]
enum RentRollField {
    Month,
    Year,
    Rent,
}

const RENT_ROLL_FIELDS: AliasTable<RentRollField> = &[
    ("Month", RentRollField::Month),
    ("Year", RentRollField::Year),
    ("Rent", RentRollField::Rent),
];

// == Shared Visitor ==
/// Drives a map visit: each key is resolved through the alias table and
/// handed to `assign`; unresolved keys have their values skipped.
struct EntityVisitor<T: Entity> {
    expecting: &'static str,
    table: AliasTable<T::Field>,
    marker: PhantomData<fn() -> T>,
}

trait Entity: Sized {
    type Field: Copy + 'static;
    type Builder: Default;

    fn assign<'de, A: MapAccess<'de>>(
        builder: &mut Self::Builder,
        field: Self::Field,
        map: &mut A,
    ) -> Result<(), A::Error>;

    fn build<E: de::Error>(builder: Self::Builder) -> Result<Self, E>;
}

impl<'de, T: Entity> Visitor<'de> for EntityVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<T, A::Error> {
        let mut builder = T::Builder::default();
        while let Some(key) = map.next_key::<String>()? {
            match resolve(&key, self.table) {
                Some(field) => T::assign(&mut builder, field, &mut map)?,
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        T::build(builder)
    }
}

fn deserialize_entity<'de, D, T>(
    deserializer: D,
    expecting: &'static str,
    table: AliasTable<T::Field>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Entity,
{
    deserializer.deserialize_map(EntityVisitor::<T> {
        expecting,
        table,
        marker: PhantomData,
    })
}

/// Null and absent lists both become empty.
fn next_list<'de, A, V>(map: &mut A) -> Result<Vec<V>, A::Error>
where
    A: MapAccess<'de>,
    V: Deserialize<'de>,
{
    Ok(map.next_value::<Option<Vec<V>>>()?.unwrap_or_default())
}

// == Property ==
#[derive(Default)]
struct PropertyBuilder {
    id: Option<String>,
    name: Option<String>,
    address: Option<String>,
    features: Vec<String>,
    highlights: Vec<String>,
    transportation: Vec<TransportationInfo>,
    spaces: Vec<Space>,
}

impl Entity for Property {
    type Field = PropertyField;
    type Builder = PropertyBuilder;

    fn assign<'de, A: MapAccess<'de>>(
        b: &mut PropertyBuilder,
        field: PropertyField,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match field {
            PropertyField::Id => b.id = Some(map.next_value()?),
            PropertyField::Name => b.name = Some(map.next_value()?),
            PropertyField::Address => b.address = map.next_value()?,
            PropertyField::Features => b.features = next_list(map)?,
            PropertyField::Highlights => b.highlights = next_list(map)?,
            PropertyField::Transportation => b.transportation = next_list(map)?,
            PropertyField::Spaces => b.spaces = next_list(map)?,
        }
        Ok(())
    }

    fn build<E: de::Error>(b: PropertyBuilder) -> Result<Self, E> {
        Ok(Property {
            id: b.id.ok_or_else(|| E::missing_field("PropertyId"))?,
            name: b.name.ok_or_else(|| E::missing_field("PropertyName"))?,
            address: b.address,
            features: b.features,
            highlights: b.highlights,
            transportation: b.transportation,
            spaces: b.spaces,
        })
    }
}

impl<'de> Deserialize<'de> for Property {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_entity(deserializer, "a property object", PROPERTY_FIELDS)
    }
}

// == Transportation Info ==
#[derive(Default)]
struct TransportationBuilder {
    kind: Option<String>,
    line: Option<String>,
    station: Option<String>,
    distance: Option<String>,
}

impl Entity for TransportationInfo {
    type Field = TransportationField;
    type Builder = TransportationBuilder;

    fn assign<'de, A: MapAccess<'de>>(
        b: &mut TransportationBuilder,
        field: TransportationField,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match field {
            TransportationField::Kind => b.kind = Some(map.next_value()?),
            TransportationField::Line => b.line = map.next_value()?,
            TransportationField::Station => b.station = map.next_value()?,
            TransportationField::Distance => b.distance = Some(map.next_value()?),
        }
        Ok(())
    }

    fn build<E: de::Error>(b: TransportationBuilder) -> Result<Self, E> {
        Ok(TransportationInfo {
            kind: b.kind.ok_or_else(|| E::missing_field("Type"))?,
            line: b.line,
            station: b.station,
            distance: b.distance.ok_or_else(|| E::missing_field("Distance"))?,
        })
    }
}

impl<'de> Deserialize<'de> for TransportationInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_entity(deserializer, "a transportation object", TRANSPORTATION_FIELDS)
    }
}

// == Space ==
#[derive(Default)]
struct SpaceBuilder {
    id: Option<String>,
    name: Option<String>,
    kind: Option<String>,
    size: Option<u64>,
    rent_roll: Vec<RentRoll>,
}

impl Entity for Space {
    type Field = SpaceField;
    type Builder = SpaceBuilder;

    fn assign<'de, A: MapAccess<'de>>(
        b: &mut SpaceBuilder,
        field: SpaceField,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match field {
            SpaceField::Id => b.id = Some(map.next_value()?),
            SpaceField::Name => b.name = Some(map.next_value()?),
            SpaceField::Kind => b.kind = map.next_value()?,
            SpaceField::Size => b.size = map.next_value()?,
            SpaceField::RentRoll => b.rent_roll = next_list(map)?,
        }
        Ok(())
    }

    fn build<E: de::Error>(b: SpaceBuilder) -> Result<Self, E> {
        Ok(Space {
            id: b.id.ok_or_else(|| E::missing_field("SpaceId"))?,
            name: b.name.ok_or_else(|| E::missing_field("SpaceName"))?,
            kind: b.kind,
            size: b.size,
            rent_roll: b.rent_roll,
        })
    }
}

impl<'de> Deserialize<'de> for Space {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_entity(deserializer, "a space object", SPACE_FIELDS)
    }
}

// == Rent Roll ==
#[derive(Default)]
struct RentRollBuilder {
    month: Option<String>,
    year: Option<i32>,
    rent: Option<f64>,
}

impl Entity for RentRoll {
    type Field = RentRollField;
    type Builder = RentRollBuilder;

    fn assign<'de, A: MapAccess<'de>>(
        b: &mut RentRollBuilder,
        field: RentRollField,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match field {
            RentRollField::Month => b.month = Some(map.next_value()?),
            RentRollField::Year => b.year = map.next_value()?,
            RentRollField::Rent => b.rent = Some(map.next_value()?),
        }
        Ok(())
    }

    fn build<E: de::Error>(b: RentRollBuilder) -> Result<Self, E> {
        let rent = b.rent.ok_or_else(|| E::missing_field("Rent"))?;
        if !rent.is_finite() || rent < 0.0 {
            return Err(E::custom(format!("rent must be a non-negative number, got {}", rent)));
        }
        Ok(RentRoll {
            month: b.month.ok_or_else(|| E::missing_field("Month"))?,
            year: b.year.unwrap_or_else(|| Utc::now().year()),
            rent,
        })
    }
}

impl<'de> Deserialize<'de> for RentRoll {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_entity(deserializer, "a rent roll object", RENT_ROLL_FIELDS)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = r#"[
        {
            "PropertyId": "P101",
            "PropertyName": "The Grand Plaza",
            "Features": ["Parking", "Gym"],
            "Highlights": ["Downtown"],
            "Transportation": [
                {"Type": "Subway", "Line": "Red", "Station": "Central", "Distance": "2 min walk"}
            ],
            "Spaces": [
                {
                    "SpaceId": "S1",
                    "SpaceName": "Suite 100",
                    "RentRoll": [
                        {"Month": "Jan", "Rent": 4500.0},
                        {"Month": "Feb", "Rent": 4550.5}
                    ]
                }
            ]
        }
    ]"#;

    #[test]
    fn test_parses_wire_format() {
        let properties = parse_slice(SAMPLE.as_bytes()).unwrap();

        assert_eq!(properties.len(), 1);
        let property = &properties[0];
        assert_eq!(property.id, "P101");
        assert_eq!(property.name, "The Grand Plaza");
        assert_eq!(property.features, vec!["Parking", "Gym"]);
        assert_eq!(property.transportation[0].kind, "Subway");
        assert_eq!(property.transportation[0].line.as_deref(), Some("Red"));
        assert_eq!(property.spaces[0].rent_roll[1].month, "Feb");
        assert_eq!(property.spaces[0].rent_roll[1].rent, 4550.5);
    }

    #[test]
    fn test_field_names_are_case_insensitive() {
        let json = r#"[{"propertyid": "p1", "PROPERTYNAME": "Loft",
            "spaces": [{"spaceID": "s1", "spacename": "A", "rentroll": [{"MONTH": "Mar", "rent": 10}]}]}]"#;
        let properties = parse_slice(json.as_bytes()).unwrap();

        assert_eq!(properties[0].id, "p1");
        assert_eq!(properties[0].name, "Loft");
        assert_eq!(properties[0].spaces[0].rent_roll[0].month, "Mar");
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"[{"PropertyId": "P1", "PropertyName": "Bare",
            "Spaces": [{"SpaceId": "S1", "SpaceName": "A", "RentRoll": [{"Month": "Jan", "Rent": 1}]}]}]"#;
        let properties = parse_slice(json.as_bytes()).unwrap();
        let property = &properties[0];

        assert!(property.address.is_none());
        assert!(property.features.is_empty());
        assert!(property.transportation.is_empty());
        assert!(property.spaces[0].kind.is_none());
        assert!(property.spaces[0].size.is_none());
        assert_eq!(property.spaces[0].rent_roll[0].year, Utc::now().year());
    }

    #[test]
    fn test_accepts_extended_fields() {
        let json = r#"[{"PropertyId": "P1", "PropertyName": "Full", "Address": "1 Main St",
            "Spaces": [{"SpaceId": "S1", "SpaceName": "A", "Type": "Retail", "Size": 900,
                "RentRoll": [{"Month": "Jan", "Year": 2023, "Rent": 1}]}]}]"#;
        let properties = parse_slice(json.as_bytes()).unwrap();
        let space = &properties[0].spaces[0];

        assert_eq!(properties[0].address.as_deref(), Some("1 Main St"));
        assert_eq!(space.kind.as_deref(), Some("Retail"));
        assert_eq!(space.size, Some(900));
        assert_eq!(space.rent_roll[0].year, 2023);
    }

    #[test]
    fn test_unknown_fields_and_null_lists_are_ignored() {
        let json = r#"[{"PropertyId": "P1", "PropertyName": "X", "Owner": {"nested": [1, 2]},
            "Features": null, "Spaces": null}]"#;
        let properties = parse_slice(json.as_bytes()).unwrap();

        assert!(properties[0].features.is_empty());
        assert!(properties[0].spaces.is_empty());
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let json = r#"[{"PropertyName": "No Id"}]"#;
        let err = parse_slice(json.as_bytes()).unwrap_err();

        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("PropertyId")));
    }

    #[test]
    fn test_negative_rent_is_parse_error() {
        let json = r#"[{"PropertyId": "P1", "PropertyName": "X",
            "Spaces": [{"SpaceId": "S1", "SpaceName": "A", "RentRoll": [{"Month": "Jan", "Rent": -5}]}]}]"#;

        assert!(matches!(
            parse_slice(json.as_bytes()),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(parse_slice(b"[{\"PropertyId\":"), Err(FetchError::Parse(_))));
        assert!(matches!(parse_slice(b"{}"), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_reader_and_slice_agree() {
        let from_slice = parse_slice(SAMPLE.as_bytes()).unwrap();
        let from_reader = parse_reader(Cursor::new(SAMPLE.as_bytes())).unwrap();

        assert_eq!(from_slice, from_reader);
    }

    #[test]
    fn test_duplicate_ids_are_kept_in_order() {
        let json = r#"[{"PropertyId": "P1", "PropertyName": "First"},
                       {"PropertyId": "p1", "PropertyName": "Second"}]"#;
        let properties = parse_slice(json.as_bytes()).unwrap();

        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].name, "First");
    }
}
