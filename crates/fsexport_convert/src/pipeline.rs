//! Per-file decoding pipeline.
//!
//! Runs the framed record reader over one file's bytes, decodes each
//! logical record through the payload decoder seam, and folds the result
//! into either a [`Tree`] (convert) or a [`FileSummary`] (analyze).
//!
//! Error policy per file: a [`RecordError`] means the byte stream cannot
//! be trusted and aborts the file; a failed payload decode is collected
//! as a [`RecordFailure`] and processing continues with the next record.

use crate::error::{ConvertError, ConvertResult};
use crate::summary::FileSummary;
use fsexport_entity::{EntityError, PayloadDecoder, Tree};
use fsexport_records::RecordReader;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Cooperative cancellation flag shared across file workers.
///
/// Workers poll the token between records, so cancellation never leaves
/// a partially reassembled record in a result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for decoding one file.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Verify chunk checksums. Disabling trades corruption detection
    /// for speed; structural checks always run.
    pub verify_checksums: bool,
    /// Optional cooperative cancellation flag.
    pub cancel: Option<CancelToken>,
}

impl DecodeOptions {
    /// Options with checksum verification enabled.
    #[must_use]
    pub fn verified() -> Self {
        Self {
            verify_checksums: true,
            cancel: None,
        }
    }
}

/// One record that failed to decode, with its position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Zero-based index of the record within its file.
    pub record_index: u64,
    /// Why the record was rejected.
    pub error: EntityError,
}

/// Outcome of processing one file: the built value plus the per-record
/// errors that were collected along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResult<T> {
    /// The built tree or summary.
    pub value: T,
    /// Number of records successfully decoded and applied.
    pub records_applied: u64,
    /// Records that could not be decoded; the file kept going.
    pub failures: Vec<RecordFailure>,
}

impl<T> FileResult<T> {
    /// Whether every record in the file decoded cleanly.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds a collection/document tree from one export file.
///
/// # Errors
///
/// Returns an error on framing corruption, I/O failure, or cancellation.
/// Payload decode failures are collected per record instead.
pub fn convert_file<R: Read>(
    reader: R,
    decoder: &dyn PayloadDecoder,
    options: &DecodeOptions,
) -> ConvertResult<FileResult<Tree>> {
    let mut tree = Tree::new();
    let result = each_record(reader, decoder, options, |entity| {
        tree.insert(&entity.key, entity.fields);
    })?;
    Ok(FileResult {
        value: tree,
        records_applied: result.records_applied,
        failures: result.failures,
    })
}

/// Tallies per-collection record counts from one export file.
///
/// Field contents are decoded only as far as needed to recover the key,
/// then dropped; nothing is retained per record.
///
/// # Errors
///
/// Same contract as [`convert_file`].
pub fn summarize_file<R: Read>(
    file_id: &str,
    reader: R,
    decoder: &dyn PayloadDecoder,
    options: &DecodeOptions,
) -> ConvertResult<FileResult<FileSummary>> {
    let mut summary = FileSummary::new();
    let result = each_record(reader, decoder, options, |entity| {
        summary.tally(entity.key.root_kind(), file_id);
    })?;
    Ok(FileResult {
        value: summary,
        records_applied: result.records_applied,
        failures: result.failures,
    })
}

/// Shared record loop driving the reader and the payload decoder.
fn each_record<R: Read>(
    reader: R,
    decoder: &dyn PayloadDecoder,
    options: &DecodeOptions,
    mut apply: impl FnMut(fsexport_entity::DecodedEntity),
) -> ConvertResult<FileResult<()>> {
    let mut records_applied = 0u64;
    let mut failures = Vec::new();
    let mut record_index = 0u64;

    for record in RecordReader::new(reader, options.verify_checksums) {
        if let Some(cancel) = &options.cancel {
            if cancel.is_cancelled() {
                return Err(ConvertError::Cancelled);
            }
        }

        let bytes = record?;
        match decoder.decode(&bytes) {
            Ok(entity) => {
                apply(entity);
                records_applied += 1;
            }
            Err(error) => {
                warn!(record = record_index, %error, "skipping undecodable record");
                failures.push(RecordFailure {
                    record_index,
                    error,
                });
            }
        }
        record_index += 1;
    }

    Ok(FileResult {
        value: (),
        records_applied,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsexport_entity::{
        BinaryEntityCodec, DecodedEntity, EntityKey, FieldMap, PathElement, Value,
    };
    use fsexport_records::RecordWriter;

    fn user(name: &str, fields: Vec<(&str, Value)>) -> DecodedEntity {
        DecodedEntity {
            key: EntityKey::new(vec![PathElement::named("User", name)]).unwrap(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn encode_file(entities: &[DecodedEntity]) -> Vec<u8> {
        let codec = BinaryEntityCodec::new();
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        for entity in entities {
            writer.write_record(&codec.encode(entity).unwrap()).unwrap();
        }
        buf
    }

    #[test]
    fn convert_builds_merged_tree() {
        let bytes = encode_file(&[
            user("a", vec![("name", "X".into())]),
            user("b", vec![("name", "Y".into())]),
            user("a", vec![("age", Value::Integer(5))]),
        ]);

        let codec = BinaryEntityCodec::new();
        let result =
            convert_file(bytes.as_slice(), &codec, &DecodeOptions::verified()).unwrap();

        assert!(result.is_complete());
        assert_eq!(result.records_applied, 3);
        let a = result.value.document("User", "a").unwrap();
        assert_eq!(a.get("name"), Some(&Value::Text("X".to_string())));
        assert_eq!(a.get("age"), Some(&Value::Integer(5)));
        assert!(result.value.document("User", "b").is_some());
    }

    #[test]
    fn summarize_counts_per_collection() {
        let bytes = encode_file(&[
            user("a", Vec::new()),
            user("b", Vec::new()),
            user("a", Vec::new()),
        ]);

        let codec = BinaryEntityCodec::new();
        let result =
            summarize_file("output-0", bytes.as_slice(), &codec, &DecodeOptions::verified())
                .unwrap();

        assert_eq!(result.value.collections()["User"].num_records, 3);
        assert_eq!(
            result.value.collections()["User"].source_files,
            vec!["output-0"]
        );
    }

    #[test]
    fn bad_record_collected_file_continues() {
        let codec = BinaryEntityCodec::new();
        let good1 = codec.encode(&user("a", vec![("n", Value::Integer(1))])).unwrap();
        let good2 = codec.encode(&user("b", vec![("n", Value::Integer(2))])).unwrap();

        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        writer.write_record(&good1).unwrap();
        writer.write_record(b"\xFFnot an entity").unwrap();
        writer.write_record(&good2).unwrap();

        let result = convert_file(buf.as_slice(), &codec, &DecodeOptions::verified()).unwrap();
        assert_eq!(result.records_applied, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].record_index, 1);
        assert!(result.value.document("User", "a").is_some());
        assert!(result.value.document("User", "b").is_some());
    }

    #[test]
    fn corruption_aborts_file() {
        let mut bytes = encode_file(&[user("a", Vec::new())]);
        bytes[0] ^= 0xFF;
        let codec = BinaryEntityCodec::new();
        let err = convert_file(bytes.as_slice(), &codec, &DecodeOptions::verified()).unwrap_err();
        assert!(matches!(err, ConvertError::Records(_)));
    }

    #[test]
    fn cancellation_stops_between_records() {
        let bytes = encode_file(&[user("a", Vec::new()), user("b", Vec::new())]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = DecodeOptions {
            verify_checksums: true,
            cancel: Some(cancel),
        };
        let codec = BinaryEntityCodec::new();
        let err = convert_file(bytes.as_slice(), &codec, &options).unwrap_err();
        assert!(matches!(err, ConvertError::Cancelled));
    }

    #[test]
    fn empty_file_yields_empty_tree() {
        let codec = BinaryEntityCodec::new();
        let result = convert_file(&[][..], &codec, &DecodeOptions::verified()).unwrap();
        assert!(result.value.is_empty());
        assert_eq!(result.records_applied, 0);
    }

    #[test]
    fn nested_fieldmap_survives_pipeline() {
        let mut address = FieldMap::new();
        address.insert("city".to_string(), Value::Text("Dar".to_string()));
        let bytes = encode_file(&[user("a", vec![("address", Value::Entity(address))])]);

        let codec = BinaryEntityCodec::new();
        let result = convert_file(bytes.as_slice(), &codec, &DecodeOptions::verified()).unwrap();
        let doc = result.value.document("User", "a").unwrap();
        let address = doc.get("address").and_then(Value::as_entity).unwrap();
        assert_eq!(address.get("city"), Some(&Value::Text("Dar".to_string())));
    }
}
