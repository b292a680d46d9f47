use serde::{Deserialize, Serialize};

/// Ordered embeddings for a whole record collection.
///
/// `vectors[i]` belongs to input text `i`; every vector has length `dim`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embeddings {
    pub vectors: Vec<Vec<f32>>,
    /// Shared dimensionality. Zero only when `vectors` is empty.
    pub dim: usize,
    /// Name of the model that produced the vectors.
    pub model_name: String,
    /// Whether every vector was L2-normalized.
    pub normalized: bool,
}

impl Embeddings {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}
