//! Error types for record framing.

use std::io;
use thiserror::Error;

/// Result type for record framing operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that can occur while reading or writing framed records.
///
/// Every non-I/O variant indicates corruption of the byte stream. The
/// stream cannot be trusted past the failure point, so decoding of the
/// file stops; no resynchronization or retry is attempted.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored and computed checksums disagree.
    #[error("checksum mismatch at offset {offset}: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Masked checksum stored in the chunk header.
        stored: u32,
        /// Masked checksum computed over type byte and payload.
        computed: u32,
        /// File offset of the chunk header.
        offset: u64,
    },

    /// The type byte is not a known chunk type.
    #[error("unknown chunk type {tag} at offset {offset}")]
    UnknownChunkType {
        /// The unrecognized type byte.
        tag: u8,
        /// File offset of the chunk header.
        offset: u64,
    },

    /// The declared payload length reads past the end of the block.
    #[error("chunk length {len} overruns block at offset {offset}")]
    LengthOverrun {
        /// Declared payload length.
        len: usize,
        /// File offset of the chunk header.
        offset: u64,
    },

    /// Chunks arrived in an order the record state machine forbids.
    #[error("chunk sequence violation at offset {offset}: {message}")]
    IllegalSequence {
        /// Description of the violation.
        message: String,
        /// File offset of the offending chunk header.
        offset: u64,
    },

    /// End of stream with an unfinished multi-chunk record.
    #[error("truncated record: end of stream with {buffered} bytes buffered")]
    TruncatedRecord {
        /// Bytes accumulated before the stream ended.
        buffered: usize,
    },
}

impl RecordError {
    /// Creates a chunk sequence violation error.
    pub fn illegal_sequence(message: impl Into<String>, offset: u64) -> Self {
        Self::IllegalSequence {
            message: message.into(),
            offset,
        }
    }
}
