//! Corpus-wide processing: parallel per-file workers plus aggregation.
//!
//! Each file is an independent unit of work with no shared mutable
//! state, so files run concurrently on a rayon pool. Results are
//! collected in sorted file order regardless of completion order, and
//! the only aggregation — counting statuses and merging summaries —
//! happens once on the collecting thread.

use crate::error::{ConvertError, ConvertResult};
use crate::pipeline::{
    convert_file, summarize_file, CancelToken, DecodeOptions, FileResult, RecordFailure,
};
use crate::source::SourceFile;
use crate::summary::{merge_summaries, CorpusSummary, FileSummary};
use fsexport_entity::{PayloadDecoder, Tree};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Options for a corpus run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Verify chunk checksums while decoding.
    pub verify_checksums: bool,
    /// Worker thread cap; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            threads: None,
        }
    }
}

/// A progress update delivered after each file completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Files finished so far, in completion order.
    pub completed: usize,
    /// Total files in the run.
    pub total: usize,
}

/// Receives each fully built tree for serialization.
///
/// The sink is called from worker threads, one whole tree at a time;
/// it never sees a partially built tree.
pub trait TreeSink: Send + Sync {
    /// Persists one file's tree.
    ///
    /// # Errors
    ///
    /// An error fails that file in the run report.
    fn write(&self, file_id: &str, tree: &Tree) -> io::Result<()>;
}

/// Terminal state of one file in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Every record decoded and applied.
    Succeeded,
    /// File finished, but some records could not be decoded.
    Partial,
    /// Fatal error; the file's output was discarded.
    Failed,
    /// Cancelled before the file finished.
    Cancelled,
}

/// Outcome of one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// The file's identifier.
    pub file_id: String,
    /// Terminal state.
    pub status: FileStatus,
    /// Records decoded and applied.
    pub records_applied: u64,
    /// Per-record decode errors, in record order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub record_errors: Vec<String>,
    /// Fatal error, for failed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole corpus run.
///
/// Always accounts for every attempted file; a failed file is reported,
/// never silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Files attempted.
    pub attempted: usize,
    /// Files that decoded completely.
    pub succeeded: usize,
    /// Files with per-record errors.
    pub partial: usize,
    /// Files that failed outright.
    pub failed: usize,
    /// Files abandoned by cancellation.
    pub cancelled: usize,
    /// Per-file outcomes in sorted file order.
    pub files: Vec<FileReport>,
}

impl RunReport {
    fn from_files(files: Vec<FileReport>) -> Self {
        let mut report = Self {
            attempted: files.len(),
            succeeded: 0,
            partial: 0,
            failed: 0,
            cancelled: 0,
            files,
        };
        for file in &report.files {
            match file.status {
                FileStatus::Succeeded => report.succeeded += 1,
                FileStatus::Partial => report.partial += 1,
                FileStatus::Failed => report.failed += 1,
                FileStatus::Cancelled => report.cancelled += 1,
            }
        }
        report
    }

    /// Whether every file decoded without a fatal error or cancellation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "processed {} file(s): {} ok, {} with record errors, {} failed, {} cancelled",
            self.attempted, self.succeeded, self.partial, self.failed, self.cancelled
        )
    }
}

/// Runs the decoding pipeline over a corpus of export files.
pub struct CorpusRunner<'a> {
    decoder: &'a dyn PayloadDecoder,
    options: RunOptions,
    progress: Option<&'a (dyn Fn(Progress) + Send + Sync)>,
    cancel: Option<CancelToken>,
}

impl<'a> CorpusRunner<'a> {
    /// Creates a runner over the given payload decoder.
    pub fn new(decoder: &'a dyn PayloadDecoder, options: RunOptions) -> Self {
        Self {
            decoder,
            options,
            progress: None,
            cancel: None,
        }
    }

    /// Installs a progress callback, invoked once per completed file.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a (dyn Fn(Progress) + Send + Sync)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Installs a cooperative cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Converts every file, handing each finished tree to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker pool cannot be built;
    /// per-file failures are reported in the [`RunReport`].
    pub fn convert(&self, files: &[SourceFile], sink: &dyn TreeSink) -> ConvertResult<RunReport> {
        info!(files = files.len(), "converting corpus");
        let outcomes = self.run_files(files, |file| (self.convert_one(file, sink), None::<()>))?;
        Ok(RunReport::from_files(
            outcomes.into_iter().map(|(report, _)| report).collect(),
        ))
    }

    /// Analyzes every file and merges the per-file summaries.
    ///
    /// # Errors
    ///
    /// Same contract as [`CorpusRunner::convert`].
    pub fn analyze(
        &self,
        files: &[SourceFile],
    ) -> ConvertResult<(RunReport, CorpusSummary)> {
        info!(files = files.len(), "analyzing corpus");
        let outcomes = self.run_files(files, |file| self.analyze_one(file))?;

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut summaries = Vec::new();
        for (report, summary) in outcomes {
            reports.push(report);
            summaries.extend(summary);
        }
        Ok((RunReport::from_files(reports), merge_summaries(summaries)))
    }

    /// Runs `process` over the files on the worker pool, preserving
    /// sorted file order in the results.
    fn run_files<T: Send>(
        &self,
        files: &[SourceFile],
        process: impl Fn(&SourceFile) -> (FileReport, Option<T>) + Sync,
    ) -> ConvertResult<Vec<(FileReport, Option<T>)>> {
        let mut ordered: Vec<&SourceFile> = files.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let completed = AtomicUsize::new(0);
        let total = ordered.len();
        let work = || {
            ordered
                .par_iter()
                .map(|file| {
                    let outcome = process(file);
                    if let Some(progress) = self.progress {
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        progress(Progress {
                            completed: done,
                            total,
                        });
                    }
                    outcome
                })
                .collect()
        };

        match self.options.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ConvertError::validation(format!("worker pool: {e}")))?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            verify_checksums: self.options.verify_checksums,
            cancel: self.cancel.clone(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn convert_one(&self, file: &SourceFile, sink: &dyn TreeSink) -> FileReport {
        if self.is_cancelled() {
            return file_report(&file.id, Err(ConvertError::Cancelled));
        }
        let outcome = File::open(&file.path)
            .map_err(ConvertError::from)
            .and_then(|f| convert_file(BufReader::new(f), self.decoder, &self.decode_options()))
            .and_then(|result| {
                sink.write(&file.id, &result.value)?;
                Ok((result.records_applied, result.failures))
            });
        file_report(&file.id, outcome)
    }

    fn analyze_one(&self, file: &SourceFile) -> (FileReport, Option<FileSummary>) {
        if self.is_cancelled() {
            return (file_report(&file.id, Err(ConvertError::Cancelled)), None);
        }
        let outcome = File::open(&file.path)
            .map_err(ConvertError::from)
            .and_then(|f| {
                summarize_file(
                    &file.id,
                    BufReader::new(f),
                    self.decoder,
                    &self.decode_options(),
                )
            });

        match outcome {
            Ok(FileResult {
                value,
                records_applied,
                failures,
            }) => {
                let report = file_report(&file.id, Ok((records_applied, failures)));
                (report, Some(value))
            }
            Err(e) => (file_report(&file.id, Err(e)), None),
        }
    }
}

/// Builds a per-file report from the pipeline outcome.
fn file_report(
    file_id: &str,
    outcome: ConvertResult<(u64, Vec<RecordFailure>)>,
) -> FileReport {
    match outcome {
        Ok((records_applied, failures)) => {
            let record_errors: Vec<String> = failures
                .iter()
                .map(|f| format!("record {}: {}", f.record_index, f.error))
                .collect();
            let status = if record_errors.is_empty() {
                FileStatus::Succeeded
            } else {
                warn!(
                    file = file_id,
                    errors = record_errors.len(),
                    "file finished with record errors"
                );
                FileStatus::Partial
            };
            FileReport {
                file_id: file_id.to_string(),
                status,
                records_applied,
                record_errors,
                error: None,
            }
        }
        Err(ConvertError::Cancelled) => FileReport {
            file_id: file_id.to_string(),
            status: FileStatus::Cancelled,
            records_applied: 0,
            record_errors: Vec::new(),
            error: None,
        },
        Err(e) => {
            warn!(file = file_id, error = %e, "file failed");
            FileReport {
                file_id: file_id.to_string(),
                status: FileStatus::Failed,
                records_applied: 0,
                record_errors: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
