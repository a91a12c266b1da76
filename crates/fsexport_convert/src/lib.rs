//! # fsexport Convert
//!
//! Applies the record decoder and tree builder to every eligible file in
//! an export directory, in parallel, and aggregates the per-file results.
//!
//! Two modes share one decoding pipeline:
//!
//! - **Convert** builds one [`fsexport_entity::Tree`] per file and hands
//!   it to a [`TreeSink`] for serialization.
//! - **Analyze** tallies per-collection record counts into a
//!   [`FileSummary`] per file and merges them into one [`CorpusSummary`].
//!
//! Failure policy: corruption is fatal to its file only; a bad record is
//! fatal to that record only; the corpus run always finishes and the
//! [`RunReport`] accounts for every file either way.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod corpus;
mod error;
mod json;
mod pipeline;
mod source;
mod summary;

pub use corpus::{
    CorpusRunner, FileReport, FileStatus, Progress, RunOptions, RunReport, TreeSink,
};
pub use error::{ConvertError, ConvertResult};
pub use json::{field_map_to_json, tree_to_json, value_to_json};
pub use pipeline::{
    convert_file, summarize_file, CancelToken, DecodeOptions, FileResult, RecordFailure,
};
pub use source::{is_export_file, list_export_files, SourceFile, EXPORT_FILE_PREFIX};
pub use summary::{merge_summaries, summarize, CollectionStats, CorpusSummary, FileSummary};
