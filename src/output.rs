// Terminal output for the CLI
// Progress bar fed from pipeline events, summary tables and problem listings

use colored::{ColoredString, Colorize};
use crossbeam_channel::Receiver;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread::{self, JoinHandle};

use verity::hash::{FinalSummary, PipelineEvent, ScanReport, Status};

const TOP_DETAIL_GROUPS: usize = 3;

/// Drain pipeline events on a dedicated thread and draw a progress line
///
/// The thread ends once every sender (the observer) has been dropped.
pub fn spawn_progress(events: Receiver<PipelineEvent>, enabled: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        let pb = if enabled {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} files | {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut bytes = 0u64;
        let mut in_flight = 0u64;
        let mut warnings = 0usize;
        let mut errors = 0usize;

        for event in events {
            match event {
                PipelineEvent::FileStarted { .. } => {}
                PipelineEvent::FileProgress { bytes_read, .. } => {
                    in_flight = bytes_read;
                }
                PipelineEvent::FileCompleted(result) => {
                    bytes += result.bytes_read;
                    in_flight = 0;
                    match result.status {
                        Status::Warning => warnings += 1,
                        Status::Error => errors += 1,
                        Status::Success => {}
                    }
                    pb.inc(1);
                }
                PipelineEvent::UnlistedFileFound(_) => warnings += 1,
            }

            // Counts instead of file names, names can be arbitrarily long
            pb.set_message(format!(
                "{} read | {} warnings, {} errors",
                format_size(bytes + in_flight, BINARY),
                warnings,
                errors
            ));
            pb.tick();
        }

        pb.finish_and_clear();
    })
}

fn status_label(status: Status) -> ColoredString {
    match status {
        Status::Success => "Success".green(),
        Status::Warning => "Warning".yellow(),
        Status::Error => "Error".red(),
    }
}

/// Print every non-success result, ordered by status then path
pub fn print_problems(summary: &FinalSummary) {
    let problems = summary.sorted_problems();
    if problems.is_empty() {
        return;
    }

    println!("\n--- Problems ({}) ---", problems.len());
    for result in problems {
        println!();
        println!("  {}  {}", status_label(result.status), result.display_path());
        if let Some(details) = &result.details {
            println!("    Details:  {}", details);
        }
        let expected = if result.entry.expected_hash.is_empty() {
            "N/A"
        } else {
            result.entry.expected_hash.as_str()
        };
        println!("    Expected: {}", expected);
        println!("    Actual:   {}", result.actual_hash.as_deref().unwrap_or("N/A"));
    }
    println!("----------------------------------------------------------------");
}

/// Print counts and the most common problem reasons
pub fn print_summary(title: &str, summary: &FinalSummary) {
    println!("\n================================================================");
    println!("  {}", title.bold());
    println!("================================================================");
    println!("  Files:       {}", summary.total_files);
    println!("  Success:     {}", summary.success_count.to_string().green());
    println!("  Warnings:    {}", summary.warning_count.to_string().yellow());
    println!("  Errors:      {}", summary.error_count.to_string().red());
    println!("  Bytes read:  {}", format_size(summary.total_bytes_read, BINARY));

    for status in [Status::Error, Status::Warning] {
        let groups = summary.top_detail_groups(status, TOP_DETAIL_GROUPS);
        if groups.is_empty() {
            continue;
        }
        println!("\n  Top {} reasons:", status_label(status));
        for group in groups {
            println!("    {:>6}  {}", group.count, group.label);
        }
    }
    println!("================================================================");
}

pub fn print_scan_report(title: &str, report: &ScanReport, manifest: &std::path::Path) {
    print_problems(&report.summary);
    print_summary(title, &report.summary);
    if report.manifest_written {
        println!(
            "Wrote {} new entries ({} total) to {}",
            report.added,
            report.manifest_entries,
            manifest.display()
        );
    } else {
        println!("{}", "Manifest not changed: no files to hash.".yellow());
    }
}
