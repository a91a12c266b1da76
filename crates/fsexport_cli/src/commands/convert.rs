//! Convert command implementation.

use fsexport_convert::{
    list_export_files, tree_to_json, CorpusRunner, Progress, RunOptions, RunReport, TreeSink,
};
use fsexport_entity::{BinaryEntityCodec, Tree};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes each file's tree as pretty-printed JSON into one directory.
pub struct JsonDirSink {
    dest: PathBuf,
}

impl JsonDirSink {
    /// Creates the sink, making the destination directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dest: &Path) -> io::Result<Self> {
        fs::create_dir_all(dest)?;
        Ok(Self {
            dest: dest.to_path_buf(),
        })
    }
}

impl TreeSink for JsonDirSink {
    fn write(&self, file_id: &str, tree: &Tree) -> io::Result<()> {
        let path = self.dest.join(format!("{file_id}.json"));
        let mut out = io::BufWriter::new(fs::File::create(&path)?);
        serde_json::to_writer_pretty(&mut out, &tree_to_json(tree))?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

/// Removes leftover `.json` files from an earlier run.
fn clean_destination(dest: &Path) -> io::Result<usize> {
    if !dest.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dest)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Runs the convert command.
///
/// # Errors
///
/// Returns an error if the source directory cannot be listed or the
/// destination cannot be prepared. Per-file decoding failures are
/// reported in the [`RunReport`] instead.
pub fn run(
    source: &Path,
    dest: &Path,
    options: RunOptions,
    clean_dest: bool,
) -> Result<RunReport, Box<dyn std::error::Error>> {
    let files = list_export_files(source)?;
    info!(
        source = %source.display(),
        dest = %dest.display(),
        files = files.len(),
        "starting conversion"
    );
    if files.is_empty() {
        println!("No export files found in {}", source.display());
    }

    if clean_dest {
        let removed = clean_destination(dest)?;
        if removed > 0 {
            debug!(removed, "cleaned destination");
            println!("Removed {removed} stale JSON file(s) from {}", dest.display());
        }
    }

    println!(
        "Converting {} file(s) from {} into {}",
        files.len(),
        source.display(),
        dest.display()
    );

    let sink = JsonDirSink::new(dest)?;
    let codec = BinaryEntityCodec::new();
    let on_progress =
        |p: Progress| println!("  [{}/{}] files converted", p.completed, p.total);
    let runner = CorpusRunner::new(&codec, options).with_progress(&on_progress);

    let report = runner.convert(&files, &sink)?;
    info!(
        succeeded = report.succeeded,
        partial = report.partial,
        failed = report.failed,
        "conversion finished"
    );
    super::print_report(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsexport_entity::{DecodedEntity, EntityKey, PathElement, Value};
    use fsexport_records::RecordWriter;

    #[test]
    fn clean_destination_removes_only_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("output-0.json"), "{}").unwrap();
        fs::write(dir.path().join("output-1.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(clean_destination(dir.path()).unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("output-0.json").exists());
    }

    #[test]
    fn clean_destination_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(clean_destination(&missing).unwrap(), 0);
    }

    #[test]
    fn run_writes_one_json_file_per_export_file() {
        let source = tempfile::tempdir().unwrap();
        let dest = source.path().join("json");

        let codec = BinaryEntityCodec::new();
        let entity = DecodedEntity {
            key: EntityKey::new(vec![PathElement::named("User", "alice")]).unwrap(),
            fields: [("age".to_string(), Value::Integer(30))]
                .into_iter()
                .collect(),
        };
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        writer.write_record(&codec.encode(&entity).unwrap()).unwrap();
        fs::write(source.path().join("output-0"), buf).unwrap();

        let report = run(source.path(), &dest, RunOptions::default(), false).unwrap();
        assert!(report.is_clean());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dest.join("output-0.json")).unwrap())
                .unwrap();
        assert_eq!(json["User"]["alice"]["age"], serde_json::json!(30));
    }
}
