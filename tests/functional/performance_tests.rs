//! Scale test: a million rows on each side
//!
//! Timed against optimized builds only; run with `cargo test --release functional`.

use keydiff::{AddressRecord, DataPuller, Dataset, DiffConfig, Strategy};
use std::time::{Duration, Instant};

const ROWS: usize = 1_000_000;

const TIME_BUDGET: Duration = Duration::from_secs(5);

/// Old and new snapshots sharing exactly one address (row 0 of each)
fn million_row_snapshots() -> (Dataset, Dataset) {
    let old: Vec<AddressRecord> = (0..ROWS)
        .map(|i| AddressRecord::new(format!("{} Old Rd", i), "Springfield", "12345", "2024-01-01"))
        .collect();
    let new: Vec<AddressRecord> = (0..ROWS)
        .map(|i| {
            let street = if i == 0 { "Old Rd" } else { "New Rd" };
            AddressRecord::new(format!("{} {}", i, street), "Springfield", "12345", "2024-02-01")
        })
        .collect();
    (Dataset::from_records(&old), Dataset::from_records(&new))
}

#[test]
#[cfg_attr(debug_assertions, ignore = "timed against release builds")]
fn test_million_rows_single_index() {
    let (old, new) = million_row_snapshots();

    let start = Instant::now();
    let result = DataPuller::new(&old, &new).get_new_records().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.len(), ROWS - 1);
    assert_eq!(result.source_rows.first(), Some(&1));
    assert_eq!(result.source_rows.last(), Some(&(ROWS - 1)));
    assert_eq!(result.stats.index.unique_fingerprints, ROWS as u64);
    assert!(elapsed < TIME_BUDGET, "took {:?}", elapsed);
}

#[test]
#[cfg_attr(debug_assertions, ignore = "timed against release builds")]
fn test_million_rows_partitioned_index() {
    let (old, new) = million_row_snapshots();
    let config = DiffConfig {
        strategy: Strategy::Partitioned,
        partition_bits: 6,
        ..DiffConfig::default()
    };

    let start = Instant::now();
    let result = DataPuller::with_config(&old, &new, config)
        .unwrap()
        .get_new_records()
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.len(), ROWS - 1);
    assert!(result.source_rows.windows(2).all(|w| w[0] < w[1]));
    assert!(elapsed < TIME_BUDGET, "took {:?}", elapsed);
}
