//! Fallback Dataset
//!
//! A fixed, valid property graph served when the blob cannot be read.

use crate::models::{Property, RentRoll, Space, TransportationInfo};

const FALLBACK_YEAR: i32 = 2024;
const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn rent_roll(rents: [f64; 6]) -> Vec<RentRoll> {
    MONTHS
        .iter()
        .zip(rents)
        .map(|(month, rent)| RentRoll {
            month: month.to_string(),
            year: FALLBACK_YEAR,
            rent,
        })
        .collect()
}

fn space(id: &str, name: &str, kind: &str, size: u64, rents: [f64; 6]) -> Space {
    Space {
        id: id.to_string(),
        name: name.to_string(),
        kind: Some(kind.to_string()),
        size: Some(size),
        rent_roll: rent_roll(rents),
    }
}

fn transit(kind: &str, line: &str, station: &str, distance: &str) -> TransportationInfo {
    TransportationInfo {
        kind: kind.to_string(),
        line: Some(line.to_string()),
        station: Some(station.to_string()),
        distance: distance.to_string(),
    }
}

/// Returns the fallback properties. Same output on every call.
pub fn fallback_properties() -> Vec<Property> {
    vec![
        Property {
            id: "P101".to_string(),
            name: "The Grand Plaza".to_string(),
            address: Some("100 Main Street".to_string()),
            features: strings(&["24/7 Security", "Underground Parking", "Fitness Center"]),
            highlights: strings(&["Central business district", "LEED Gold certified"]),
            transportation: vec![
                transit("Subway", "Red Line", "Central Station", "3 min walk"),
                transit("Bus", "Route 12", "Main & 1st", "1 min walk"),
            ],
            spaces: vec![
                space(
                    "S101",
                    "Suite 101",
                    "Office",
                    1_200,
                    [4_500.0, 4_500.0, 4_550.0, 4_550.0, 4_600.0, 4_600.0],
                ),
                space(
                    "S102",
                    "Suite 102",
                    "Office",
                    950,
                    [3_600.0, 3_600.0, 3_600.0, 3_650.0, 3_650.0, 3_700.0],
                ),
                space(
                    "S103",
                    "Ground Floor Retail",
                    "Retail",
                    2_000,
                    [7_800.0, 7_800.0, 7_900.0, 7_900.0, 8_000.0, 8_000.0],
                ),
            ],
        },
        Property {
            id: "P102".to_string(),
            name: "Ocean View Tower".to_string(),
            address: Some("25 Harbor Drive".to_string()),
            features: strings(&["Rooftop Terrace", "Concierge", "Bike Storage"]),
            highlights: strings(&["Waterfront views", "Recently renovated lobby"]),
            transportation: vec![transit("Ferry", "Harbor Line", "Pier 4", "5 min walk")],
            spaces: vec![
                space(
                    "S201",
                    "Unit 1A",
                    "Office",
                    1_500,
                    [5_200.0, 5_200.0, 5_250.0, 5_300.0, 5_300.0, 5_350.0],
                ),
                space(
                    "S202",
                    "Unit 2B",
                    "Office",
                    800,
                    [2_900.0, 2_900.0, 2_950.0, 2_950.0, 3_000.0, 3_000.0],
                ),
            ],
        },
    ]
}
