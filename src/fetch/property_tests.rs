//! Property-Based Tests for Fetch Module
//!
//! Uses proptest to check the size-gating policy and that both fetch paths
//! parse identical bytes into identical graphs.

use std::io::{self, Read};

use proptest::prelude::*;

use crate::error::FetchError;
use crate::fetch::{FetchLimits, FetchPath};
use crate::parse::{parse_reader, parse_slice};

// == Strategies ==
fn limits_strategy() -> impl Strategy<Value = FetchLimits> {
    (1u64..1_000_000, 0u64..1_000_000).prop_map(|(max, threshold)| FetchLimits {
        max_size_bytes: max,
        streaming_threshold_bytes: threshold.min(max),
        ..FetchLimits::default()
    })
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,24}".prop_map(|s| s)
}

fn rent_roll_json() -> impl Strategy<Value = String> {
    ("[A-Z][a-z]{2}", 0u32..100_000)
        .prop_map(|(month, rent)| format!(r#"{{"Month":"{}","Rent":{}}}"#, month, rent))
}

fn space_json() -> impl Strategy<Value = String> {
    (
        name_strategy(),
        name_strategy(),
        prop::collection::vec(rent_roll_json(), 0..6),
    )
        .prop_map(|(id, name, rolls)| {
            format!(
                r#"{{"SpaceId":"{}","SpaceName":"{}","RentRoll":[{}]}}"#,
                id,
                name,
                rolls.join(",")
            )
        })
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            name_strategy(),
            name_strategy(),
            prop::collection::vec(name_strategy(), 0..4),
            prop::collection::vec(space_json(), 0..4),
        ),
        0..6,
    )
    .prop_map(|properties| {
        let items: Vec<String> = properties
            .into_iter()
            .map(|(id, name, features, spaces)| {
                let features: Vec<String> =
                    features.iter().map(|f| format!("\"{}\"", f)).collect();
                format!(
                    r#"{{"PropertyId":"{}","PropertyName":"{}","Features":[{}],"Spaces":[{}]}}"#,
                    id,
                    name,
                    features.join(","),
                    spaces.join(",")
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    })
}

/// Reader handing out at most `chunk` bytes per call, like a slow stream.
struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every size maps to exactly one outcome, split at the threshold and maximum.
    #[test]
    fn prop_select_path_partitions_sizes(limits in limits_strategy(), size in 0u64..1_100_000) {
        match limits.select_path(size) {
            Ok(FetchPath::Direct) => prop_assert!(size <= limits.streaming_threshold_bytes),
            Ok(FetchPath::Streaming) => {
                prop_assert!(size > limits.streaming_threshold_bytes);
                prop_assert!(size <= limits.max_size_bytes);
            }
            Err(FetchError::SizeLimitExceeded { size: reported, limit }) => {
                prop_assert!(size > limits.max_size_bytes);
                prop_assert_eq!(reported, size);
                prop_assert_eq!(limit, limits.max_size_bytes);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    // Buffered and incremental parsing agree for any document and read window.
    #[test]
    fn prop_buffered_and_streamed_parse_agree(doc in document_strategy(), chunk in 1usize..64) {
        let buffered = parse_slice(doc.as_bytes()).unwrap();
        let streamed = parse_reader(ChunkedReader { data: doc.as_bytes(), chunk }).unwrap();

        prop_assert_eq!(buffered, streamed);
    }

    // Source order of spaces and rent rolls survives parsing.
    #[test]
    fn prop_parse_preserves_nested_order(doc in document_strategy()) {
        let parsed = parse_slice(doc.as_bytes()).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&doc).unwrap();

        for (property, raw_property) in parsed.iter().zip(raw.as_array().unwrap()) {
            let raw_spaces = raw_property["Spaces"].as_array().unwrap();
            prop_assert_eq!(property.spaces.len(), raw_spaces.len());
            for (space, raw_space) in property.spaces.iter().zip(raw_spaces) {
                prop_assert_eq!(&space.id, raw_space["SpaceId"].as_str().unwrap());
                let months: Vec<&str> = raw_space["RentRoll"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| r["Month"].as_str().unwrap())
                    .collect();
                let parsed_months: Vec<&str> =
                    space.rent_roll.iter().map(|r| r.month.as_str()).collect();
                prop_assert_eq!(parsed_months, months);
            }
        }
    }
}
