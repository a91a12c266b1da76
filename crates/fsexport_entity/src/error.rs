//! Error types for entity decoding and encoding.

use thiserror::Error;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors that can occur while decoding or encoding an entity payload.
///
/// These are per-record failures: one bad payload never aborts the file
/// it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// Payload ended before the declared structure was complete.
    #[error("unexpected end of payload")]
    UnexpectedEof,

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// The payload declares a format version this decoder does not know.
    #[error("unsupported payload version {version}")]
    UnsupportedVersion {
        /// Declared version byte.
        version: u8,
    },

    /// A field value carries a type tag outside the representable set.
    #[error("unsupported value type tag {tag} in field {field:?}")]
    UnsupportedValue {
        /// The unrecognized value tag.
        tag: u8,
        /// Field the value belonged to.
        field: String,
    },

    /// An entity key must have at least one path element.
    #[error("entity key is empty")]
    EmptyKey,

    /// Payload structure is malformed.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the structural problem.
        message: String,
    },

    /// Value could not be encoded.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the problem.
        message: String,
    },
}

impl EntityError {
    /// Creates a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Creates an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }
}
