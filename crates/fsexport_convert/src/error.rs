//! Error types for the conversion pipeline.

use fsexport_entity::EntityError;
use fsexport_records::RecordError;
use std::io;
use thiserror::Error;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while converting or analyzing export files.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Record framing corruption; fatal to the current file.
    #[error("record error: {0}")]
    Records(#[from] RecordError),

    /// Entity payload error escalated to a file-level failure.
    #[error("entity error: {0}")]
    Entity(#[from] EntityError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Precondition violation at the boundary; no partial work attempted.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the violated precondition.
        message: String,
    },

    /// The run was cancelled before this file finished.
    #[error("cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
