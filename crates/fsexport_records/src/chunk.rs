//! Chunk header layout and checksum helpers.

/// Size of a log block. Chunks never cross a block boundary.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Size of a chunk header.
/// masked crc32c (4) + length (2) + type (1) = 7 bytes
pub const HEADER_SIZE: usize = 7;

/// Checksum mask delta from the LevelDB log format.
///
/// Stored checksums are rotated and offset so that a CRC of data that
/// happens to contain embedded CRCs does not collide with itself.
const MASK_DELTA: u32 = 0xa282_ead8;

/// Position of a chunk within a logical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkType {
    /// A complete record in a single chunk.
    Full = 1,
    /// The first fragment of a multi-chunk record.
    First = 2,
    /// An interior fragment.
    Middle = 3,
    /// The final fragment; emitting it completes the record.
    Last = 4,
}

impl ChunkType {
    /// Converts a byte to a chunk type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }

    /// Converts the chunk type to its wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Computes the masked CRC32C stored in a chunk header.
///
/// The checksum covers the type byte followed by the payload bytes.
#[must_use]
pub fn chunk_crc(chunk_type: u8, payload: &[u8]) -> u32 {
    let crc = crc32c::crc32c_append(crc32c::crc32c(&[chunk_type]), payload);
    mask_crc(crc)
}

/// Applies the LevelDB checksum mask.
#[must_use]
pub fn mask_crc(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Removes the LevelDB checksum mask.
#[must_use]
pub fn unmask_crc(masked: u32) -> u32 {
    let rot = masked.wrapping_sub(MASK_DELTA);
    (rot >> 17) | (rot << 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_type_roundtrip() {
        for t in [
            ChunkType::Full,
            ChunkType::First,
            ChunkType::Middle,
            ChunkType::Last,
        ] {
            assert_eq!(ChunkType::from_byte(t.as_byte()), Some(t));
        }
    }

    #[test]
    fn chunk_type_rejects_invalid() {
        assert_eq!(ChunkType::from_byte(0), None);
        assert_eq!(ChunkType::from_byte(5), None);
        assert_eq!(ChunkType::from_byte(0xFF), None);
    }

    #[test]
    fn mask_roundtrip() {
        for crc in [0u32, 1, 0xDEAD_BEEF, u32::MAX, 0xCBF4_3926] {
            assert_eq!(unmask_crc(mask_crc(crc)), crc);
        }
    }

    #[test]
    fn mask_changes_value() {
        // The mask exists so a stored checksum differs from the raw CRC.
        assert_ne!(mask_crc(0xCBF4_3926), 0xCBF4_3926);
    }

    #[test]
    fn crc_depends_on_type_byte() {
        let payload = b"payload";
        assert_ne!(
            chunk_crc(ChunkType::Full.as_byte(), payload),
            chunk_crc(ChunkType::First.as_byte(), payload)
        );
    }

    #[test]
    fn crc_of_empty_payload_is_stable() {
        let a = chunk_crc(ChunkType::Full.as_byte(), b"");
        let b = chunk_crc(ChunkType::Full.as_byte(), b"");
        assert_eq!(a, b);
    }
}
