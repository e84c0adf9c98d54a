//! Synthetic address snapshots for load testing
//!
//! Every row is derived from `(seed, row)` alone, so a snapshot can be
//! regenerated exactly and generated in parallel.

use crate::dataset::{AddressRecord, Dataset};
use rayon::prelude::*;

const STREETS: [&str; 20] = [
    "Main St", "Oak St", "Pine St", "Maple St", "Cedar Ave", "Elm St", "Washington Ave",
    "Lake Rd", "Hill St", "Park Ave", "Sunset Blvd", "River Rd", "Church St", "Mill Rd",
    "Spring St", "Highland Ave", "Forest Dr", "Center St", "Broadway", "Market St",
];

const CITIES: [(&str, &str); 10] = [
    ("New York", "10001"),
    ("Los Angeles", "90001"),
    ("San Francisco", "94101"),
    ("Chicago", "60601"),
    ("Houston", "77001"),
    ("Phoenix", "85001"),
    ("Philadelphia", "19019"),
    ("San Antonio", "78201"),
    ("San Diego", "92101"),
    ("Dallas", "75201"),
];

/// Highest generated house number
pub const MAX_HOUSE_NUMBER: u64 = 9999;

#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    seed: u64,
    as_of_date: String,
}

impl SnapshotGenerator {
    pub fn new(seed: u64, as_of_date: impl Into<String>) -> Self {
        Self {
            seed,
            as_of_date: as_of_date.into(),
        }
    }

    /// The record at position `row`
    pub fn record(&self, row: u64) -> AddressRecord {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(&row.to_le_bytes());
        let digest = hasher.finalize();
        let bytes = digest.as_bytes();

        let pick = |offset: usize| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[offset..offset + 8]);
            u64::from_le_bytes(word)
        };

        let house = pick(0) % MAX_HOUSE_NUMBER + 1;
        let street = STREETS[(pick(8) % STREETS.len() as u64) as usize];
        let (city, zip) = CITIES[(pick(16) % CITIES.len() as u64) as usize];

        AddressRecord::new(format!("{} {}", house, street), city, zip, self.as_of_date.clone())
    }

    pub fn generate(&self, rows: usize) -> Dataset {
        let records: Vec<AddressRecord> = (0..rows as u64)
            .into_par_iter()
            .map(|row| self.record(row))
            .collect();
        Dataset::from_records(&records)
    }
}
