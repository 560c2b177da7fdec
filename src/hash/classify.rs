//! Three-way classification of a verified file.

use std::time::SystemTime;

/// Outcome of checking one file, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum Status {
    Success,
    Warning,
    Error,
}

impl Status {
    /// Upper-case label used in TSV reports.
    pub fn as_report_label(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Success => "Success",
            Status::Warning => "Warning",
            Status::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Classify a verified file.
///
/// Rules apply in order: a missing hash on either side is an error, equal
/// hashes (ignoring ASCII case) are a success, a mismatch on a file written
/// after the manifest is a warning, any other mismatch is an error.
pub fn classify(
    expected_hash: Option<&str>,
    actual_hash: Option<&str>,
    file_modified: SystemTime,
    manifest_modified: SystemTime,
) -> Status {
    let (expected, actual) = match (expected_hash, actual_hash) {
        (Some(e), Some(a)) if !e.trim().is_empty() && !a.trim().is_empty() => (e.trim(), a.trim()),
        _ => return Status::Error,
    };

    if expected.eq_ignore_ascii_case(actual) {
        Status::Success
    } else if file_modified > manifest_modified {
        Status::Warning
    } else {
        Status::Error
    }
}
