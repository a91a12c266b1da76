//! Analyze command implementation.

use fsexport_convert::{list_export_files, CorpusRunner, RunOptions, RunReport};
use fsexport_entity::BinaryEntityCodec;
use std::fs;
use std::path::Path;
use tracing::info;

/// Runs the analyze command.
///
/// Writes the merged summary to `analysis.json` in the source directory
/// and prints it.
///
/// # Errors
///
/// Returns an error if the source directory cannot be listed or the
/// summary cannot be written. Per-file decoding failures are reported
/// in the [`RunReport`] instead.
pub fn run(source: &Path, options: RunOptions) -> Result<RunReport, Box<dyn std::error::Error>> {
    let files = list_export_files(source)?;
    info!(source = %source.display(), files = files.len(), "starting analysis");
    if files.is_empty() {
        println!("No export files found in {}", source.display());
    }
    println!("Analyzing {} file(s) in {}", files.len(), source.display());

    let codec = BinaryEntityCodec::new();
    let runner = CorpusRunner::new(&codec, options);
    let (report, summary) = runner.analyze(&files)?;

    let json = serde_json::to_string_pretty(&summary)?;
    let out_path = source.join("analysis.json");
    fs::write(&out_path, format!("{json}\n"))?;
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        output = %out_path.display(),
        "analysis finished"
    );
    println!("{json}");
    println!("Analysis written to {}", out_path.display());

    super::print_report(&report);
    Ok(report)
}
