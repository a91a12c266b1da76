//! Framed record writer.
//!
//! Mirrors the reader: payloads that fit in the current block are written
//! as one `Full` chunk; larger payloads are split into `First`/`Middle`/
//! `Last` fragments at block boundaries. A block tail too short for a
//! chunk header is filled with zeros.

use crate::chunk::{chunk_crc, ChunkType, BLOCK_SIZE, HEADER_SIZE};
use crate::error::RecordResult;
use std::io::Write;

/// Writes logical records in the block/chunk log format.
pub struct RecordWriter<W: Write> {
    dest: W,
    /// Write position within the current block.
    block_pos: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Creates a writer positioned at the start of a block.
    pub fn new(dest: W) -> Self {
        Self { dest, block_pos: 0 }
    }

    /// Appends one logical record.
    ///
    /// Zero-length records are valid and produce a zero-length `Full`
    /// chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the destination fails. The stream
    /// is not usable after a failed write.
    pub fn write_record(&mut self, payload: &[u8]) -> RecordResult<()> {
        let mut remaining = payload;
        let mut begin = true;

        loop {
            let leftover = BLOCK_SIZE - self.block_pos;
            if leftover < HEADER_SIZE {
                // Pad out the block; the reader treats this tail as padding.
                self.dest.write_all(&vec![0u8; leftover])?;
                self.block_pos = 0;
                continue;
            }

            let available = BLOCK_SIZE - self.block_pos - HEADER_SIZE;
            let take = remaining.len().min(available);
            let end = take == remaining.len();

            let chunk_type = match (begin, end) {
                (true, true) => ChunkType::Full,
                (true, false) => ChunkType::First,
                (false, true) => ChunkType::Last,
                (false, false) => ChunkType::Middle,
            };

            self.write_chunk(chunk_type, &remaining[..take])?;
            remaining = &remaining[take..];
            begin = false;

            if end {
                return Ok(());
            }
        }
    }

    /// Flushes the destination.
    pub fn flush(&mut self) -> RecordResult<()> {
        self.dest.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying destination.
    pub fn into_inner(mut self) -> RecordResult<W> {
        self.dest.flush()?;
        Ok(self.dest)
    }

    fn write_chunk(&mut self, chunk_type: ChunkType, payload: &[u8]) -> RecordResult<()> {
        debug_assert!(payload.len() <= u16::MAX as usize);
        debug_assert!(self.block_pos + HEADER_SIZE + payload.len() <= BLOCK_SIZE);

        let type_byte = chunk_type.as_byte();
        let crc = chunk_crc(type_byte, payload);

        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&crc.to_le_bytes());
        header[4..6].copy_from_slice(&(payload.len() as u16).to_le_bytes());
        header[6] = type_byte;

        self.dest.write_all(&header)?;
        self.dest.write_all(payload)?;
        self.block_pos += HEADER_SIZE + payload.len();
        Ok(())
    }
}
