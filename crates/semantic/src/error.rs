use thiserror::Error;

/// Errors surfaced while turning texts into embeddings.
///
/// All of them are fatal for a build: the pipeline never emits partial output
/// when the embedding service misbehaves.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The HTTP request could not be completed or returned a non-success status.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The service answered with a body we cannot interpret as embeddings.
    #[error("unexpected embedding response: {0}")]
    Response(String),
    /// A batch came back with a different number of vectors than texts sent.
    #[error("batch {batch} returned {actual} vectors for {expected} texts")]
    BatchSizeMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },
    /// A vector's length differs from the first vector's.
    #[error("record {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// The service returned a zero-length vector.
    #[error("record {index} has an empty embedding")]
    EmptyVector { index: usize },
    /// The vector contains NaN or infinite components.
    #[error("record {index} has a non-finite embedding component")]
    NonFinite { index: usize },
}

impl SemanticError {
    /// Index of the record the failure points at, when known.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            SemanticError::DimensionMismatch { index, .. }
            | SemanticError::EmptyVector { index }
            | SemanticError::NonFinite { index } => Some(*index),
            _ => None,
        }
    }
}
