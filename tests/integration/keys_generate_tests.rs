//! Integration tests for the keys and generate commands

use crate::common::sample_data::old_addresses;
use crate::common::CliTestRunner;
use keydiff::generate::SnapshotGenerator;

#[test]
fn test_keys_command() {
    let runner = CliTestRunner::new().unwrap();
    let input = runner
        .fixture()
        .create_address_csv("addresses.csv", &old_addresses())
        .unwrap();

    runner.expect_success(&["keys", input.to_str().unwrap(), "--limit", "1"]);
    runner.expect_success(&["keys", input.to_str().unwrap(), "--format", "json"]);
}

#[test]
fn test_keys_missing_column() {
    let runner = CliTestRunner::new().unwrap();
    let input = runner
        .fixture()
        .create_csv("partial.csv", &[vec!["address", "city"], vec!["1 Elm St", "Dover"]])
        .unwrap();

    let error = runner.expect_failure(&["keys", input.to_str().unwrap()]);
    assert!(matches!(error, keydiff::KeydiffError::Schema { .. }));
    assert!(error.to_string().contains("zip"));
}

#[test]
fn test_generate_command() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let output = fixture.path("generated.csv");

    runner.expect_success(&[
        "generate",
        output.to_str().unwrap(),
        "--rows",
        "250",
        "--seed",
        "11",
        "--as-of-date",
        "2024-05-01",
    ]);

    let dataset = fixture.load(&output).unwrap();
    assert_eq!(dataset.row_count(), 250);
    assert_eq!(dataset.column_names(), vec!["address", "city", "zip", "as_of_date"]);

    let expected = SnapshotGenerator::new(11, "2024-05-01").generate(250);
    assert_eq!(dataset, expected);
}

#[test]
fn test_generate_rejects_unknown_extension() {
    let runner = CliTestRunner::new().unwrap();
    let output = runner.fixture().path("generated.xlsx");

    let error = runner.expect_failure(&["generate", output.to_str().unwrap(), "--rows", "5"]);
    assert!(matches!(error, keydiff::KeydiffError::InvalidInput { .. }));
}

#[test]
fn test_generated_snapshots_diff_cleanly() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let snapshot = fixture.path("snapshot.csv");
    let summary_path = fixture.path("summary.json");

    runner.expect_success(&["generate", snapshot.to_str().unwrap(), "--rows", "500"]);
    runner.expect_success(&[
        "diff",
        "--old",
        snapshot.to_str().unwrap(),
        "--new",
        snapshot.to_str().unwrap(),
        "--summary",
        summary_path.to_str().unwrap(),
    ]);

    let summary: keydiff::output::DiffSummary =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary.stats.new_rows, 500);
    assert_eq!(summary.stats.new_only_rows, 0);
    assert!(summary.sample_keys.is_empty());
}
