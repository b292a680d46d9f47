use thiserror::Error;

/// Errors returned by the projection and normalization stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid config: n_neighbors must be >= 2 (got {n_neighbors})")]
    InvalidNeighbors { n_neighbors: usize },

    #[error("invalid config: spread must be finite and > 0 (got {spread})")]
    InvalidSpread { spread: f64 },

    #[error("invalid config: min_dist must be within [0, spread] (got min_dist={min_dist}, spread={spread})")]
    InvalidMinDist { min_dist: f64, spread: f64 },

    #[error("invalid config: n_epochs must be >= 1 when set")]
    InvalidEpochs,

    #[error("invalid config: base_radius must be finite and >= 0 (got {base_radius})")]
    InvalidRadius { base_radius: f64 },

    #[error("invalid config: shell_thickness must be finite and >= 0 (got {shell_thickness})")]
    InvalidThickness { shell_thickness: f64 },

    #[error("invalid config: scale must be finite and > 0 (got {scale})")]
    InvalidScale { scale: f64 },

    #[error("unknown metric `{0}` (expected cosine, euclidean or manhattan)")]
    UnknownMetric(String),

    #[error("{strategy} projection requires embeddings")]
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

    #[error("layout produced a non-finite coordinate for point {index}")]
    NonFiniteOutput { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_values() {
        let err = ProjectionError::InvalidMinDist {
            min_dist: 2.0,
            spread: 1.0,
        };
        assert!(err.to_string().contains("min_dist=2"));

        let err = ProjectionError::MissingEmbeddings { strategy: "learned" };
        assert_eq!(err.to_string(), "learned projection requires embeddings");
    }
}
