//! CLI command implementations.

pub mod analyze;
pub mod convert;

use fsexport_convert::{FileStatus, RunReport};

/// Prints per-file problems and the final one-line report.
pub(crate) fn print_report(report: &RunReport) {
    for file in &report.files {
        match file.status {
            FileStatus::Succeeded => {}
            FileStatus::Partial => {
                println!(
                    "  {}: {} record(s) could not be decoded",
                    file.file_id,
                    file.record_errors.len()
                );
                for error in &file.record_errors {
                    println!("    {error}");
                }
            }
            FileStatus::Failed => {
                let reason = file.error.as_deref().unwrap_or("unknown error");
                println!("  {}: failed ({reason})", file.file_id);
            }
            FileStatus::Cancelled => {
                println!("  {}: cancelled", file.file_id);
            }
        }
    }

    println!();
    if report.is_clean() {
        println!("✓ {}", report.summary_line());
    } else {
        println!("✗ {}", report.summary_line());
    }
}
