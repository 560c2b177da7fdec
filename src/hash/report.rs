//! Tab-separated problem report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::HashUtilityError;
use super::summary::FinalSummary;

pub const TSV_HEADER: &str = "#Status\tFile\tDetails\tExpectedHash\tActualHash";

/// Write one row per problematic result, ordered by status then path.
pub fn write_tsv_report<W: Write>(writer: &mut W, summary: &FinalSummary) -> std::io::Result<()> {
    writeln!(writer, "{}", TSV_HEADER)?;

    for result in summary.sorted_problems() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            result.status.as_report_label(),
            tsv_field(&result.display_path()),
            tsv_field(result.details.as_deref().unwrap_or_default()),
            tsv_field(&result.entry.expected_hash),
            tsv_field(result.actual_hash.as_deref().unwrap_or_default()),
        )?;
    }
    writer.flush()
}

pub fn write_tsv_report_file(path: &Path, summary: &FinalSummary) -> Result<(), HashUtilityError> {
    let file = File::create(path)
        .map_err(|e| HashUtilityError::from_io_error(e, "creating report", Some(path.to_path_buf())))?;
    let mut writer = BufWriter::new(file);
    write_tsv_report(&mut writer, summary)
        .map_err(|e| HashUtilityError::from_io_error(e, "writing report", Some(path.to_path_buf())))
}

// Tabs and line breaks would shift columns
fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}
