//! Export file discovery.

use crate::error::{ConvertError, ConvertResult};
use std::path::{Path, PathBuf};

/// Base-name prefix of export shard files.
///
/// Firestore/Datastore exports name their shards `output-0`, `output-1`,
/// and so on. Anything else in the directory (metadata files, previous
/// JSON output) is silently skipped.
pub const EXPORT_FILE_PREFIX: &str = "output-";

/// Whether a base name identifies an export shard.
#[must_use]
pub fn is_export_file(name: &str) -> bool {
    name.starts_with(EXPORT_FILE_PREFIX)
}

/// One export shard: its identifier (the base name) and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Base file name, used for attribution in summaries and reports.
    pub id: String,
    /// Location on disk.
    pub path: PathBuf,
}

/// Lists the export shards in a directory, lexicographically sorted by
/// file name so repeated runs aggregate in the same order.
///
/// # Errors
///
/// Returns a validation error if `dir` is not an existing directory.
pub fn list_export_files(dir: &Path) -> ConvertResult<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(ConvertError::validation(format!(
            "source directory does not exist: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && is_export_file(&name) {
            files.push(SourceFile {
                id: name,
                path: entry.path(),
            });
        }
    }
    files.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(files)
}
