//! End-to-end scenarios for finding new records

use crate::common::sample_data::{new_addresses, old_addresses, record};
use keydiff::dataset::Column;
use keydiff::{AddressRecord, DataPuller, Dataset, DiffConfig, Strategy};

fn expected_with_keys(records: &[AddressRecord]) -> Dataset {
    let keys: Vec<String> = records
        .iter()
        .map(|r| format!("{}, {}, {}", r.address, r.city, r.zip))
        .collect();
    Dataset::from_records(records)
        .with_column(Column::text("full_address", keys))
        .unwrap()
}

#[test]
fn test_all_new_records_are_returned_with_keys() {
    let old = Dataset::from_records(&[record("123 Main St", "New York", "10001", "2024-01-01")]);
    let new_records = vec![
        record("456 Oak St", "Los Angeles", "90001", "2024-02-01"),
        record("789 Pine St", "San Francisco", "94101", "2024-02-02"),
    ];
    let new = Dataset::from_records(&new_records);

    let result = DataPuller::new(&old, &new).get_new_records().unwrap();

    assert_eq!(result.dataset, expected_with_keys(&new_records));
    assert_eq!(
        result.keys(),
        vec![
            "456 Oak St, Los Angeles, 90001",
            "789 Pine St, San Francisco, 94101"
        ]
    );
}

#[test]
fn test_identical_snapshots_yield_nothing() {
    let old = Dataset::from_records(&old_addresses());
    let new = Dataset::from_records(&old_addresses());

    let result = DataPuller::new(&old, &new).get_new_records().unwrap();

    assert!(result.is_empty());
    assert_eq!(result.stats.new_only_rows, 0);
    assert!(result.dataset.column("full_address").is_some());
}

#[test]
fn test_empty_old_snapshot_returns_everything_in_order() {
    let old = Dataset::from_records(&[]);
    let new_records = vec![
        record("2 Second St", "Austin", "73301", "2024-02-01"),
        record("1 First St", "Austin", "73301", "2024-02-01"),
    ];
    let new = Dataset::from_records(&new_records);

    let result = DataPuller::new(&old, &new).get_new_records().unwrap();

    assert_eq!(result.source_rows, vec![0, 1]);
    assert_eq!(result.dataset, expected_with_keys(&new_records));
}

#[test]
fn test_overlapping_snapshots_keep_only_unseen_addresses() {
    let old = Dataset::from_records(&old_addresses());
    let new = Dataset::from_records(&new_addresses());

    let result = DataPuller::new(&old, &new).get_new_records().unwrap();

    assert_eq!(
        result.dataset,
        expected_with_keys(&[record("789 Pine St", "San Francisco", "94101", "2024-02-02")])
    );
    assert_eq!(result.stats.old_rows, 2);
    assert_eq!(result.stats.new_rows, 2);
    assert_eq!(result.stats.new_only_rows, 1);
}

#[test]
fn test_reappearing_address_with_new_date_is_not_new() {
    let old = Dataset::from_records(&[record("10 Ridge Rd", "Boise", "83701", "2023-06-30")]);
    let new = Dataset::from_records(&[record("10 Ridge Rd", "Boise", "83701", "2024-06-30")]);

    let result = DataPuller::new(&old, &new).get_new_records().unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_partitioned_strategy_scenarios() {
    let config = DiffConfig {
        strategy: Strategy::Partitioned,
        partition_bits: 2,
        ..DiffConfig::default()
    };
    let old = Dataset::from_records(&old_addresses());
    let new = Dataset::from_records(&new_addresses());

    let result = DataPuller::with_config(&old, &new, config)
        .unwrap()
        .get_new_records()
        .unwrap();

    assert_eq!(result.stats.strategy, Strategy::Partitioned);
    assert_eq!(result.keys(), vec!["789 Pine St, San Francisco, 94101"]);
}
