//! # fsexport Records
//!
//! Framed record reader/writer for the block-based log format used by
//! Firestore/Datastore export files.
//!
//! ## Log Format
//!
//! A file is a sequence of fixed-size 32 KiB blocks. Each block holds zero
//! or more chunks:
//!
//! ```text
//! | masked crc32c (4, LE) | length (2, LE) | type (1) | payload (N) |
//! ```
//!
//! A logical record is either one `Full` chunk or a `First` chunk, any
//! number of `Middle` chunks, and one `Last` chunk. Chunks never cross a
//! block boundary; a block tail shorter than a chunk header is zero padding.
//!
//! ## Corruption Policy
//!
//! The reader never resynchronizes. A checksum mismatch, an unknown chunk
//! type, an out-of-order chunk, a length that overruns the block, or end of
//! stream with an unfinished record all fail the file with [`RecordError`].
//! Checksum verification can be disabled for speed; all structural checks
//! remain active.
//!
//! ## Example
//!
//! ```
//! use fsexport_records::{RecordReader, RecordWriter};
//!
//! let mut buf = Vec::new();
//! let mut writer = RecordWriter::new(&mut buf);
//! writer.write_record(b"hello").unwrap();
//! writer.write_record(b"world").unwrap();
//!
//! let records: Vec<_> = RecordReader::new(buf.as_slice(), true)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records, vec![b"hello".to_vec(), b"world".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod error;
mod reader;
mod writer;

pub use chunk::{chunk_crc, ChunkType, BLOCK_SIZE, HEADER_SIZE};
pub use error::{RecordError, RecordResult};
pub use reader::RecordReader;
pub use writer::RecordWriter;
