//! fsexport CLI
//!
//! Converts Datastore export files into per-file JSON documents, or
//! analyzes a backup directory without writing any output.
//!
//! # Modes
//!
//! - `convert` - Decode every export file and write one JSON file each
//! - `analyze` - Tally per-collection record counts across the backup

mod commands;

use clap::{Parser, ValueEnum};
use fsexport_convert::RunOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Datastore export file converter.
#[derive(Parser)]
#[command(name = "fsexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the export files
    source_dir: PathBuf,

    /// Destination directory for JSON output (defaults to <source_dir>/json)
    dest_dir: Option<PathBuf>,

    /// What to do with the export files
    #[arg(short, long, value_enum, default_value_t = Action::Convert)]
    action: Action,

    /// Skip chunk checksum verification
    #[arg(short = 'c', long)]
    no_check_crc: bool,

    /// Delete stale .json files from the destination before converting
    #[arg(short = 'C', long)]
    clean_dest: bool,

    /// Number of worker threads (defaults to one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Processing mode.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Decode files and write JSON output
    Convert,
    /// Tally record counts without writing output
    Analyze,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = RunOptions {
        verify_checksums: !cli.no_check_crc,
        threads: cli.jobs,
    };

    let outcome = match cli.action {
        Action::Convert => {
            let dest = cli
                .dest_dir
                .clone()
                .unwrap_or_else(|| cli.source_dir.join("json"));
            commands::convert::run(&cli.source_dir, &dest, options, cli.clean_dest)
        }
        Action::Analyze => commands::analyze::run(&cli.source_dir, options),
    };

    match outcome {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
