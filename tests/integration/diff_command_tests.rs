//! Integration tests for the diff command

use crate::common::sample_data::{new_addresses, numbered, old_addresses, record};
use crate::common::CliTestRunner;
use keydiff::output::DiffSummary;
use keydiff::Strategy;
use std::fs;

#[test]
fn test_diff_writes_new_only_records() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &old_addresses()).unwrap();
    let new = fixture.create_address_csv("new.csv", &new_addresses()).unwrap();
    let output = fixture.path("out/new_records.csv");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    assert!(output.exists());
    let result = fixture.load(&output).unwrap();
    assert_eq!(
        result.column_names(),
        vec!["address", "city", "zip", "as_of_date", "full_address"]
    );
    assert_eq!(
        fixture.column_values(&output, "full_address").unwrap(),
        vec!["789 Pine St, San Francisco, 94101"]
    );
    assert_eq!(
        fixture.column_values(&output, "as_of_date").unwrap(),
        vec!["2024-02-02"]
    );
}

#[test]
fn test_diff_writes_summary() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &old_addresses()).unwrap();
    let new = fixture.create_address_csv("new.csv", &new_addresses()).unwrap();
    let summary_path = fixture.path("summary.json");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--summary",
        summary_path.to_str().unwrap(),
        "--format",
        "json",
    ]);

    let summary: DiffSummary =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary.format_version, keydiff::FORMAT_VERSION);
    assert_eq!(summary.key_fields, vec!["address", "city", "zip"]);
    assert_eq!(summary.stats.old_rows, 2);
    assert_eq!(summary.stats.new_rows, 2);
    assert_eq!(summary.stats.new_only_rows, 1);
    assert_eq!(summary.stats.strategy, Strategy::Single);
    assert_eq!(summary.sample_keys, vec!["789 Pine St, San Francisco, 94101"]);
    assert!(summary.output.is_none());
}

#[test]
fn test_diff_partitioned_matches_single() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &numbered(0, 300, "2024-01-01")).unwrap();
    let new = fixture.create_address_csv("new.csv", &numbered(150, 300, "2024-02-01")).unwrap();
    let single = fixture.path("single.csv");
    let partitioned = fixture.path("partitioned.csv");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        single.to_str().unwrap(),
    ]);
    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        partitioned.to_str().unwrap(),
        "--strategy",
        "partitioned",
        "--partition-bits",
        "5",
        "--batch-size",
        "16",
    ]);

    let single_keys = fixture.column_values(&single, "full_address").unwrap();
    let partitioned_keys = fixture.column_values(&partitioned, "full_address").unwrap();
    assert_eq!(single_keys.len(), 150);
    assert_eq!(single_keys, partitioned_keys);
    assert_eq!(single_keys[0], "300 Test Ave, Springfield, 12345");
}

#[test]
fn test_diff_with_config_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture
        .create_csv(
            "old.csv",
            &[vec!["sku", "region", "price"], vec!["A-1", "EU", "10"], vec!["A-2", "EU", "12"]],
        )
        .unwrap();
    let new = fixture
        .create_csv(
            "new.csv",
            &[vec!["sku", "region", "price"], vec!["A-1", "EU", "11"], vec!["A-1", "US", "10"]],
        )
        .unwrap();
    let config = fixture
        .create_raw(
            "keydiff.json",
            br#"{"key": {"fields": ["sku", "region"], "separator": "/", "key_column": "product_key"}}"#,
        )
        .unwrap();
    let output = fixture.path("out.csv");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    assert_eq!(fixture.column_values(&output, "product_key").unwrap(), vec!["A-1/US"]);
}

#[test]
fn test_diff_rejects_invalid_config() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &old_addresses()).unwrap();
    let new = fixture.create_address_csv("new.csv", &new_addresses()).unwrap();
    let config = fixture
        .create_raw("bad.json", br#"{"partition_bits": 99}"#)
        .unwrap();

    let error = runner.expect_failure(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(matches!(error, keydiff::KeydiffError::Config { .. }));
}

#[test]
fn test_diff_to_parquet_output() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &old_addresses()).unwrap();
    let new = fixture.create_address_csv("new.csv", &new_addresses()).unwrap();
    let output = fixture.path("new_records.parquet");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    assert_eq!(
        fixture.column_values(&output, "address").unwrap(),
        vec!["789 Pine St"]
    );
}

#[test]
fn test_diff_output_feeds_another_diff() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_address_csv("old.csv", &old_addresses()).unwrap();
    let new = fixture.create_address_csv("new.csv", &new_addresses()).unwrap();
    let first = fixture.path("first.csv");
    let second = fixture.path("second.csv");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        first.to_str().unwrap(),
    ]);
    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        first.to_str().unwrap(),
        "--output",
        second.to_str().unwrap(),
    ]);

    let result = fixture.load(&second).unwrap();
    assert_eq!(
        result.column_names(),
        vec!["address", "city", "zip", "as_of_date", "full_address"]
    );
    assert_eq!(
        fixture.column_values(&second, "full_address").unwrap(),
        vec!["789 Pine St, San Francisco, 94101"]
    );
}

#[test]
fn test_diff_keeps_empty_identity_values() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture
        .create_address_csv("old.csv", &[record("1 Elm St", "", "19901", "2024-01-01")])
        .unwrap();
    let new = fixture
        .create_raw(
            "new.csv",
            b"address,city,zip,as_of_date\n1 Elm St,\"\",19901,2024-02-01\n2 Elm St,\"\",19901,2024-02-01\n",
        )
        .unwrap();
    let output = fixture.path("out.csv");

    runner.expect_success(&[
        "diff",
        "--old",
        old.to_str().unwrap(),
        "--new",
        new.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    assert_eq!(
        fixture.column_values(&output, "full_address").unwrap(),
        vec!["2 Elm St, , 19901"]
    );
    assert_eq!(fixture.column_values(&output, "city").unwrap(), vec![""]);
}
