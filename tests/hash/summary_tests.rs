// Tests for summary aggregation

use verity::hash::summary::{DETAIL_UNLISTED, NO_DETAILS_LABEL, OTHER_LABEL};
use verity::hash::{ChecksumEntry, DetailGroup, Severity, Status, SummaryAggregator, VerificationResult};

fn result(path: &str, status: Status, details: Option<&str>) -> VerificationResult {
    let r = VerificationResult::new(ChecksumEntry::new("aa", path), status);
    match details {
        Some(d) => r.with_details(d),
        None => r,
    }
}

fn group(label: &str, count: usize) -> DetailGroup {
    DetailGroup {
        label: label.to_string(),
        count,
    }
}

#[test]
fn test_counts_and_bytes() {
    let mut aggregator = SummaryAggregator::new();
    aggregator.record(VerificationResult::new(ChecksumEntry::new("aa", "a"), Status::Success).with_actual_hash("aa", 100));
    aggregator.record(result("b", Status::Warning, Some("x")));
    aggregator.record(result("c", Status::Error, Some("y")));
    aggregator.record_unlisted("d", "/root/d");

    let summary = aggregator.finish(3);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.warning_count, 2);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.total_bytes_read, 100);
    assert_eq!(summary.problematic_results.len(), 3);

    let unlisted = summary
        .problematic_results
        .iter()
        .find(|r| r.entry.relative_path == "d")
        .unwrap();
    assert_eq!(unlisted.entry.expected_hash, "");
    assert_eq!(unlisted.details.as_deref(), Some(DETAIL_UNLISTED));
}

#[test]
fn test_severity_and_exit_codes() {
    let clean = SummaryAggregator::new().finish(0);
    assert_eq!(clean.severity(), Severity::Clean);
    assert_eq!(clean.exit_code(), 0);

    let mut aggregator = SummaryAggregator::new();
    aggregator.record(result("w", Status::Warning, None));
    let warnings = aggregator.finish(1);
    assert_eq!(warnings.severity(), Severity::Warnings);
    assert_eq!(warnings.exit_code(), 1);

    let mut aggregator = SummaryAggregator::new();
    aggregator.record(result("w", Status::Warning, None));
    aggregator.record(result("e", Status::Error, None));
    let errors = aggregator.finish(2);
    assert_eq!(errors.severity(), Severity::Errors);
    assert_eq!(errors.exit_code(), 2);
}

#[test]
fn test_top_detail_groups_folds_remainder() {
    let mut aggregator = SummaryAggregator::new();
    for (i, details) in ["mismatch", "mismatch", "mismatch", "missing", "missing", "denied", "io", "zzz"]
        .into_iter()
        .enumerate()
    {
        aggregator.record(result(&format!("f{}", i), Status::Error, Some(details)));
    }
    aggregator.record(result("n", Status::Error, None));
    aggregator.record(result("w", Status::Warning, Some("newer")));
    let summary = aggregator.finish(10);

    assert_eq!(
        summary.top_detail_groups(Status::Error, 3),
        vec![
            group("mismatch", 3),
            group("missing", 2),
            group(NO_DETAILS_LABEL, 1),
            group(OTHER_LABEL, 3),
        ]
    );
    assert_eq!(summary.top_detail_groups(Status::Warning, 3), vec![group("newer", 1)]);
    assert!(summary.top_detail_groups(Status::Success, 3).is_empty());

    // Grouping is a view, the problem list stays intact
    assert_eq!(summary.problematic_results.len(), 10);
}

#[test]
fn test_sorted_problems_by_status_then_path() {
    let mut aggregator = SummaryAggregator::new();
    aggregator.record(result("z", Status::Error, None));
    aggregator.record(result("b", Status::Warning, None));
    aggregator.record(result("a", Status::Error, None));
    aggregator.record(result("c", Status::Warning, None));
    let summary = aggregator.finish(4);

    let order: Vec<(&str, Status)> = summary
        .sorted_problems()
        .into_iter()
        .map(|r| (r.entry.relative_path.as_str(), r.status))
        .collect();
    assert_eq!(
        order,
        vec![
            ("b", Status::Warning),
            ("c", Status::Warning),
            ("a", Status::Error),
            ("z", Status::Error),
        ]
    );
}

#[test]
fn test_summary_serializes_to_json() {
    let mut aggregator = SummaryAggregator::new();
    aggregator.record(result("b", Status::Warning, Some("Cannot read file: denied")));
    let summary = aggregator.finish(1);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["warning_count"], 1);
    assert_eq!(json["problematic_results"][0]["status"], "Warning");
    assert_eq!(json["problematic_results"][0]["entry"]["relative_path"], "b");
}
