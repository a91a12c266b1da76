//! Per-file and corpus-wide record count summaries.

use fsexport_entity::EntityKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Record count and file attribution for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Number of records seen for this collection.
    pub num_records: u64,
    /// Files that contributed those records, in processing order.
    pub source_files: Vec<String>,
}

/// Per-collection record counts for a single export file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileSummary {
    collections: BTreeMap<String, CollectionStats>,
}

impl FileSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one record under its top-level collection kind.
    pub fn tally(&mut self, kind: &str, file_id: &str) {
        let stats = self.collections.entry(kind.to_string()).or_default();
        stats.num_records += 1;
        if stats.source_files.last().map(String::as_str) != Some(file_id) {
            stats.source_files.push(file_id.to_string());
        }
    }

    /// Per-collection stats, sorted by collection name.
    #[must_use]
    pub fn collections(&self) -> &BTreeMap<String, CollectionStats> {
        &self.collections
    }

    /// Whether no record was tallied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Per-collection totals across a whole corpus of export files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CorpusSummary {
    collections: BTreeMap<String, CollectionStats>,
}

impl CorpusSummary {
    /// Creates an empty corpus summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one file's summary into the totals.
    ///
    /// Counts sum; file attributions concatenate in merge order.
    pub fn absorb(&mut self, summary: FileSummary) {
        for (kind, stats) in summary.collections {
            let total = self.collections.entry(kind).or_default();
            total.num_records += stats.num_records;
            total.source_files.extend(stats.source_files);
        }
    }

    /// Per-collection totals, sorted by collection name.
    #[must_use]
    pub fn collections(&self) -> &BTreeMap<String, CollectionStats> {
        &self.collections
    }
}

/// Summarizes a sequence of decoded record keys for one file.
pub fn summarize(file_id: &str, keys: impl IntoIterator<Item = EntityKey>) -> FileSummary {
    let mut summary = FileSummary::new();
    for key in keys {
        summary.tally(key.root_kind(), file_id);
    }
    summary
}

/// Merges file summaries into one corpus summary.
pub fn merge_summaries(summaries: impl IntoIterator<Item = FileSummary>) -> CorpusSummary {
    let mut corpus = CorpusSummary::new();
    for summary in summaries {
        corpus.absorb(summary);
    }
    corpus
}
