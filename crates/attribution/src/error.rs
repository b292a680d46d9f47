use thiserror::Error;

/// Errors returned by the attribution stage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttributionError {
    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("invalid color `{0}`: expected #RRGGBB")]
    InvalidColor(String),

    #[error("invalid config: num_clusters must be >= 1 (got {num_clusters})")]
    InvalidClusters { num_clusters: usize },

    #[error("invalid config: n_init must be >= 1 (got {n_init})")]
    InvalidInit { n_init: usize },

    #[error("invalid config: max_iter must be >= 1 (got {max_iter})")]
    InvalidMaxIter { max_iter: usize },

    #[error("invalid config: tol must be finite and >= 0 (got {tol})")]
    InvalidTolerance { tol: f64 },

    #[error("invalid config: medium_min_words ({medium}) must be below large_min_words ({large})")]
    InvalidSizeThresholds { medium: usize, large: usize },

    #[error("invalid config: point sizes must be finite and > 0")]
    InvalidPointSize,

    #[error("{strategy} coloring requires embeddings")]
    MissingEmbeddings { strategy: &'static str },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embeddings must have at least one component")]
    EmptyVector,

    #[error("embedding {index} contains a non-finite component")]
    NonFiniteInput { index: usize },
}
