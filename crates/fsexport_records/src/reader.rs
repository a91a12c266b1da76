//! Streaming record reader.
//!
//! Reads the source one 32 KiB block at a time and reassembles logical
//! records from their chunks, keeping memory proportional to one block
//! plus the record currently being reassembled.

use crate::chunk::{chunk_crc, ChunkType, BLOCK_SIZE, HEADER_SIZE};
use crate::error::{RecordError, RecordResult};
use std::io::Read;

/// A streaming reader over framed records.
///
/// Yields each logical record as its exact original byte string, in file
/// order. The sequence is lazy, finite, and non-restartable.
///
/// # Example
///
/// ```ignore
/// let reader = RecordReader::new(file, true);
/// for record in reader {
///     let bytes = record?;
///     // Decode the entity payload...
/// }
/// ```
pub struct RecordReader<R: Read> {
    source: R,
    /// Whether to verify chunk checksums. Structural checks always run.
    verify_checksums: bool,
    /// Current block contents. Only the final block may be short.
    block: Vec<u8>,
    /// Number of valid bytes in `block`.
    block_len: usize,
    /// Read position within `block`.
    pos: usize,
    /// File offset of the start of `block`.
    block_offset: u64,
    /// Reassembly buffer, open between `First` and `Last` chunks.
    fragment: Option<Vec<u8>>,
    /// Whether iteration has ended, normally or with an error.
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    /// Creates a reader over the given byte source.
    ///
    /// With `verify_checksums` disabled, CRC computation is skipped
    /// entirely; corruption may then pass through undetected.
    pub fn new(source: R, verify_checksums: bool) -> Self {
        Self {
            source,
            verify_checksums,
            block: vec![0u8; BLOCK_SIZE],
            block_len: 0,
            pos: 0,
            block_offset: 0,
            fragment: None,
            finished: false,
        }
    }

    /// File offset of the next unread byte.
    fn offset(&self) -> u64 {
        self.block_offset + self.pos as u64
    }

    /// Reads the next block, returning `false` at end of stream.
    ///
    /// Reads until the block buffer is full or the source is exhausted,
    /// so a short read from the source does not truncate a block.
    fn refill_block(&mut self) -> RecordResult<bool> {
        self.block_offset += self.block_len as u64;
        self.block_len = 0;
        self.pos = 0;

        while self.block_len < BLOCK_SIZE {
            let n = self.source.read(&mut self.block[self.block_len..])?;
            if n == 0 {
                break;
            }
            self.block_len += n;
        }

        Ok(self.block_len > 0)
    }

    /// Reads chunks until a logical record completes.
    ///
    /// Returns `Ok(None)` at a clean end of stream.
    fn read_next_record(&mut self) -> RecordResult<Option<Vec<u8>>> {
        loop {
            // A block tail too short for a header is zero padding.
            if self.pos + HEADER_SIZE > self.block_len {
                if !self.refill_block()? {
                    return match self.fragment.take() {
                        Some(buf) => Err(RecordError::TruncatedRecord {
                            buffered: buf.len(),
                        }),
                        None => Ok(None),
                    };
                }
                continue;
            }

            let header_offset = self.offset();
            let header = &self.block[self.pos..self.pos + HEADER_SIZE];
            let stored_crc = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let len = u16::from_le_bytes([header[4], header[5]]) as usize;
            let type_byte = header[6];

            // Chunks never cross a block boundary.
            if self.pos + HEADER_SIZE + len > self.block_len {
                self.finished = true;
                return Err(RecordError::LengthOverrun {
                    len,
                    offset: header_offset,
                });
            }

            let chunk_type = ChunkType::from_byte(type_byte).ok_or_else(|| {
                RecordError::UnknownChunkType {
                    tag: type_byte,
                    offset: header_offset,
                }
            })?;

            let payload_start = self.pos + HEADER_SIZE;
            let payload = &self.block[payload_start..payload_start + len];

            if self.verify_checksums {
                let computed = chunk_crc(type_byte, payload);
                if computed != stored_crc {
                    self.finished = true;
                    return Err(RecordError::ChecksumMismatch {
                        stored: stored_crc,
                        computed,
                        offset: header_offset,
                    });
                }
            }

            match chunk_type {
                ChunkType::Full => {
                    if self.fragment.is_some() {
                        return Err(RecordError::illegal_sequence(
                            "Full chunk while a fragmented record is open",
                            header_offset,
                        ));
                    }
                    let record = payload.to_vec();
                    self.pos = payload_start + len;
                    return Ok(Some(record));
                }
                ChunkType::First => {
                    if self.fragment.is_some() {
                        return Err(RecordError::illegal_sequence(
                            "First chunk while a fragmented record is open",
                            header_offset,
                        ));
                    }
                    self.fragment = Some(payload.to_vec());
                }
                ChunkType::Middle => match self.fragment.as_mut() {
                    Some(buf) => buf.extend_from_slice(payload),
                    None => {
                        return Err(RecordError::illegal_sequence(
                            "Middle chunk with no record open",
                            header_offset,
                        ));
                    }
                },
                ChunkType::Last => match self.fragment.take() {
                    Some(mut buf) => {
                        buf.extend_from_slice(payload);
                        self.pos = payload_start + len;
                        return Ok(Some(buf));
                    }
                    None => {
                        return Err(RecordError::illegal_sequence(
                            "Last chunk with no record open",
                            header_offset,
                        ));
                    }
                },
            }

            self.pos = payload_start + len;
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = RecordResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::mask_crc;
    use crate::writer::RecordWriter;

    fn encode(records: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        for record in records {
            writer.write_record(record).unwrap();
        }
        buf
    }

    fn decode(bytes: &[u8], verify: bool) -> RecordResult<Vec<Vec<u8>>> {
        RecordReader::new(bytes, verify).collect()
    }

    /// Builds a single raw chunk with a valid checksum.
    fn raw_chunk(chunk_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(&chunk_crc(chunk_type, payload).to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        buf.push(chunk_type);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn empty_stream() {
        assert!(decode(&[], true).unwrap().is_empty());
    }

    #[test]
    fn single_full_record() {
        let bytes = encode(&[b"hello"]);
        assert_eq!(decode(&bytes, true).unwrap(), vec![b"hello".to_vec()]);
    }

    #[test]
    fn zero_length_record() {
        let bytes = encode(&[b"", b"x", b""]);
        assert_eq!(
            decode(&bytes, true).unwrap(),
            vec![Vec::new(), b"x".to_vec(), Vec::new()]
        );
    }

    #[test]
    fn many_records_in_order() {
        let records: Vec<Vec<u8>> = (0..100u32)
            .map(|i| i.to_le_bytes().repeat(i as usize % 7 + 1))
            .collect();
        let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
        let bytes = encode(&refs);
        assert_eq!(decode(&bytes, true).unwrap(), records);
    }

    #[test]
    fn record_spanning_multiple_blocks() {
        // Over three blocks: First / Middle / Last.
        let big = vec![0xABu8; BLOCK_SIZE * 2 + 100];
        let bytes = encode(&[&big]);
        assert!(bytes.len() > BLOCK_SIZE * 2);
        assert_eq!(decode(&bytes, true).unwrap(), vec![big]);
    }

    #[test]
    fn fragmentation_is_transparent() {
        // The same payload, written fragmented by hand and as one Full
        // chunk, decodes to the same logical record.
        let payload = b"abcdefgh";
        let mut fragmented = raw_chunk(ChunkType::First.as_byte(), &payload[..3]);
        fragmented.extend(raw_chunk(ChunkType::Middle.as_byte(), &payload[3..5]));
        fragmented.extend(raw_chunk(ChunkType::Last.as_byte(), &payload[5..]));
        let whole = raw_chunk(ChunkType::Full.as_byte(), payload);

        assert_eq!(decode(&fragmented, true).unwrap(), decode(&whole, true).unwrap());
        assert_eq!(decode(&whole, true).unwrap(), vec![payload.to_vec()]);
    }

    #[test]
    fn block_padding_is_skipped() {
        // Fill a block so fewer than HEADER_SIZE bytes remain, then start
        // the next record in a fresh block.
        let first = vec![1u8; BLOCK_SIZE - HEADER_SIZE - 3];
        let bytes = encode(&[&first, b"tail"]);
        assert_eq!(bytes.len() % BLOCK_SIZE, HEADER_SIZE + 4);
        assert_eq!(
            decode(&bytes, true).unwrap(),
            vec![first, b"tail".to_vec()]
        );
    }

    #[test]
    fn payload_bit_flip_detected() {
        let mut bytes = encode(&[b"sensitive"]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::ChecksumMismatch { .. }));
    }

    #[test]
    fn header_crc_bit_flip_detected() {
        let mut bytes = encode(&[b"sensitive"]);
        bytes[0] ^= 0x80;
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::ChecksumMismatch { .. }));
    }

    #[test]
    fn bit_flip_passes_without_verification() {
        let mut bytes = encode(&[b"sensitive"]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let records = decode(&bytes, false).unwrap();
        assert_eq!(records.len(), 1);
        assert_ne!(records[0], b"sensitive");
    }

    #[test]
    fn error_stops_iteration() {
        let mut bytes = encode(&[b"one", b"two"]);
        bytes[0] ^= 0xFF;
        let mut reader = RecordReader::new(bytes.as_slice(), true);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn unknown_chunk_type_is_corruption() {
        let mut bytes = raw_chunk(ChunkType::Full.as_byte(), b"data");
        // Rewrite type byte and its checksum so only the tag is wrong.
        bytes[6] = 9;
        let crc = mask_crc(crc32c::crc32c_append(crc32c::crc32c(&[9]), b"data"));
        bytes[0..4].copy_from_slice(&crc.to_le_bytes());
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownChunkType { tag: 9, offset: 0 }
        ));
    }

    #[test]
    fn length_overrun_is_corruption() {
        let mut bytes = raw_chunk(ChunkType::Full.as_byte(), b"data");
        bytes[4..6].copy_from_slice(&u16::MAX.to_le_bytes());
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::LengthOverrun { .. }));
    }

    #[test]
    fn truncated_mid_payload_of_last_chunk() {
        let mut bytes = raw_chunk(ChunkType::First.as_byte(), b"begin");
        bytes.extend(raw_chunk(ChunkType::Last.as_byte(), b"finish"));
        bytes.truncate(bytes.len() - 3);
        let mut reader = RecordReader::new(bytes.as_slice(), true);
        // Zero records emitted, then the corruption error.
        let first = reader.next().unwrap();
        assert!(first.is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn eof_with_open_fragment_is_truncation() {
        let bytes = raw_chunk(ChunkType::First.as_byte(), b"begin");
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(
            err,
            RecordError::TruncatedRecord { buffered: 5 }
        ));
    }

    #[test]
    fn middle_without_first_is_corruption() {
        let bytes = raw_chunk(ChunkType::Middle.as_byte(), b"orphan");
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::IllegalSequence { .. }));
    }

    #[test]
    fn last_without_first_is_corruption() {
        let bytes = raw_chunk(ChunkType::Last.as_byte(), b"orphan");
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::IllegalSequence { .. }));
    }

    #[test]
    fn full_while_fragment_open_is_corruption() {
        let mut bytes = raw_chunk(ChunkType::First.as_byte(), b"begin");
        bytes.extend(raw_chunk(ChunkType::Full.as_byte(), b"intruder"));
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::IllegalSequence { .. }));
    }

    #[test]
    fn first_while_fragment_open_is_corruption() {
        let mut bytes = raw_chunk(ChunkType::First.as_byte(), b"begin");
        bytes.extend(raw_chunk(ChunkType::First.as_byte(), b"again"));
        let err = decode(&bytes, true).unwrap_err();
        assert!(matches!(err, RecordError::IllegalSequence { .. }));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn roundtrip_arbitrary_records(
                records in prop::collection::vec(
                    prop::collection::vec(any::<u8>(), 0..(BLOCK_SIZE * 2)),
                    0..8,
                )
            ) {
                let refs: Vec<&[u8]> = records.iter().map(|r| r.as_slice()).collect();
                let bytes = encode(&refs);
                let decoded = decode(&bytes, true).unwrap();
                prop_assert_eq!(decoded, records);
            }
        }
    }
}
