//! Decode errors.
//!
//! Every failure aborts the current decode pass.  A single misread moves the
//! cursor unpredictably, so there is no local recovery: each variant carries
//! the byte offset at which the problem was detected plus whatever
//! expected/actual detail is needed to diagnose a malformed file.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// A read or advance would move past the end of the buffer.
    #[error("out of bounds at offset {offset}: need {needed} byte(s), {available} available")]
    OutOfBounds { offset: usize, needed: usize, available: usize },

    /// A header read was attempted at an offset that is not 8-byte aligned.
    #[error("misaligned element header at offset {offset}")]
    MisalignedElement { offset: usize },

    /// A subelement's type tag does not match what the grammar requires.
    #[error("unexpected data type at offset {offset} in {context}: expected {expected}, found {found}")]
    UnexpectedDataType {
        offset:   usize,
        context:  &'static str,
        expected: String,
        found:    String,
    },

    /// A byte-length field has the wrong value or is not the required multiple.
    #[error("invalid length at offset {offset} in {context}: {detail}")]
    InvalidLength {
        offset:  usize,
        context: &'static str,
        detail:  String,
    },

    /// Cell, sparse, object, or an unknown class tag.
    #[error("unsupported matrix class {class} at offset {offset}")]
    UnsupportedMatrixClass { offset: usize, class: String },

    #[error("decompression failed for element at offset {offset}: {reason}")]
    DecompressionFailed { offset: usize, reason: String },

    /// More struct field values than declared field names.
    #[error("field index {index} exceeds {count} declared field name(s) at offset {offset}")]
    FieldIndexExceeded { offset: usize, index: usize, count: usize },

    #[error("struct nesting exceeds depth limit {limit} at offset {offset}")]
    DepthLimitExceeded { offset: usize, limit: usize },

    #[error("invalid file header: {0}")]
    InvalidHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Byte offset the error was raised at, when it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::OutOfBounds { offset, .. }
            | DecodeError::MisalignedElement { offset }
            | DecodeError::UnexpectedDataType { offset, .. }
            | DecodeError::InvalidLength { offset, .. }
            | DecodeError::UnsupportedMatrixClass { offset, .. }
            | DecodeError::DecompressionFailed { offset, .. }
            | DecodeError::FieldIndexExceeded { offset, .. }
            | DecodeError::DepthLimitExceeded { offset, .. } => Some(*offset),
            DecodeError::InvalidHeader(_) | DecodeError::Io(_) => None,
        }
    }
}
