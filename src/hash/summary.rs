//! Run totals and problem grouping.

use std::collections::HashMap;
use std::path::PathBuf;

use super::classify::Status;
use super::pipeline::{ChecksumEntry, VerificationResult};

/// Details text for files on disk that the manifest does not list.
pub const DETAIL_UNLISTED: &str = "File exists but not in checksum list.";
/// Group label for results without a details text.
pub const NO_DETAILS_LABEL: &str = "(no details)";
/// Group label for everything past the top groups.
pub const OTHER_LABEL: &str = "Other";

/// Tallies results as they arrive. Success results are counted, not kept.
#[derive(Debug, Default)]
pub struct SummaryAggregator {
    success_count: usize,
    warning_count: usize,
    error_count: usize,
    total_bytes_read: u64,
    problematic_results: Vec<VerificationResult>,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: VerificationResult) {
        self.total_bytes_read += result.bytes_read;
        match result.status {
            Status::Success => self.success_count += 1,
            Status::Warning => {
                self.warning_count += 1;
                self.problematic_results.push(result);
            }
            Status::Error => {
                self.error_count += 1;
                self.problematic_results.push(result);
            }
        }
    }

    /// Record a file found on disk but missing from the manifest.
    pub fn record_unlisted(&mut self, relative_path: impl Into<String>, full_path: impl Into<PathBuf>) {
        let result = VerificationResult::new(ChecksumEntry::unhashed(relative_path), Status::Warning)
            .with_details(DETAIL_UNLISTED)
            .with_full_path(full_path);
        self.record(result);
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn finish(self, total_files: usize) -> FinalSummary {
        FinalSummary {
            total_files,
            success_count: self.success_count,
            warning_count: self.warning_count,
            error_count: self.error_count,
            total_bytes_read: self.total_bytes_read,
            problematic_results: self.problematic_results,
        }
    }
}

/// Overall outcome of a run, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Severity {
    Clean,
    Warnings,
    Errors,
}

/// One line of the "top problems" breakdown.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DetailGroup {
    pub label: String,
    pub count: usize,
}

/// Result of one pipeline run.
///
/// `total_files` counts dispatched jobs; unlisted files found afterwards only
/// show up in `warning_count` and `problematic_results`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FinalSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub total_bytes_read: u64,
    pub problematic_results: Vec<VerificationResult>,
}

impl FinalSummary {
    pub fn severity(&self) -> Severity {
        if self.error_count > 0 {
            Severity::Errors
        } else if self.warning_count > 0 {
            Severity::Warnings
        } else {
            Severity::Clean
        }
    }

    /// Process exit code: 0 clean, 1 warnings, 2 errors
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            Severity::Clean => 0,
            Severity::Warnings => 1,
            Severity::Errors => 2,
        }
    }

    /// Group problems of one status by details text.
    ///
    /// Groups are ordered by count (descending) then label. Only `top_n` are
    /// kept; the rest are summed into a trailing "Other" group.
    pub fn top_detail_groups(&self, status: Status, top_n: usize) -> Vec<DetailGroup> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for result in self.problematic_results.iter().filter(|r| r.status == status) {
            let label = result.details.as_deref().unwrap_or(NO_DETAILS_LABEL);
            *counts.entry(label).or_default() += 1;
        }

        let mut groups: Vec<DetailGroup> = counts
            .into_iter()
            .map(|(label, count)| DetailGroup {
                label: label.to_string(),
                count,
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        if groups.len() > top_n {
            let other: usize = groups[top_n..].iter().map(|g| g.count).sum();
            groups.truncate(top_n);
            groups.push(DetailGroup {
                label: OTHER_LABEL.to_string(),
                count: other,
            });
        }
        groups
    }

    /// Problems ordered by status, then relative path
    pub fn sorted_problems(&self) -> Vec<&VerificationResult> {
        let mut problems: Vec<&VerificationResult> = self.problematic_results.iter().collect();
        problems.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| a.entry.relative_path.cmp(&b.entry.relative_path))
        });
        problems
    }
}

// Tests in tests/hash/summary_tests.rs
