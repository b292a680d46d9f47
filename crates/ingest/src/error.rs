//! Error types produced by the ingest crate.
//!
//! Every variant except [`Read`](IngestError::Read) is a data-format failure:
//! the input could be read but does not have the expected shape. Variants that
//! can be pinned to a single record carry its position (and id when known) so
//! the caller can point the user at the offending entry.
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | [`Read`](IngestError::Read) | the input file cannot be read |
//! | [`NotAnArray`](IngestError::NotAnArray) | the document is not a JSON array |
//! | [`MalformedRecord`](IngestError::MalformedRecord) | an entry is not a record object |
//! | [`MissingField`](IngestError::MissingField) | strict mode, `id` or `text` absent |
//! | [`EmptyText`](IngestError::EmptyText) | strict mode, whitespace-only text |
//! | [`DuplicateId`](IngestError::DuplicateId) | strict mode, id seen twice |
//!
//! ```rust
//! use ingest::IngestError;
//!
//! let err = IngestError::MissingField { index: 3, field: "text" };
//! assert!(err.is_data_format());
//! assert_eq!(err.record_index(), Some(3));
//! ```
use thiserror::Error;

/// Errors that can occur while loading message records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The input artifact could not be read from disk.
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// The document parsed, or failed to parse, as something other than a
    /// JSON array.
    #[error("input is not a JSON array of message records: {0}")]
    NotAnArray(String),

    /// An array entry could not be decoded as a message record.
    #[error("record {index} is malformed: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// A required field is absent or blank (strict mode).
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// The record's text is empty or whitespace-only (strict mode).
    #[error("record {index} ({id}) has empty text")]
    EmptyText { index: usize, id: String },

    /// Two records share an id (strict mode).
    #[error("record {index} reuses id `{id}` first seen at record {first_index}")]
    DuplicateId {
        index: usize,
        id: String,
        first_index: usize,
    },
}

impl IngestError {
    /// Returns true when the input was readable but structurally invalid.
    pub fn is_data_format(&self) -> bool {
        !matches!(self, IngestError::Read { .. })
    }

    /// Position of the offending record, when the failure is localizable.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            IngestError::MalformedRecord { index, .. }
            | IngestError::MissingField { index, .. }
            | IngestError::EmptyText { index, .. }
            | IngestError::DuplicateId { index, .. } => Some(*index),
            IngestError::Read { .. } | IngestError::NotAnArray(_) => None,
        }
    }
}
