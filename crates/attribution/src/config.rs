use serde::{Deserialize, Serialize};

use crate::AttributionError;

/// Parameters of the semantic clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringParams {
    /// Requested cluster count. Clamped to the record count at run time.
    pub num_clusters: usize,
    /// Independent restarts; the lowest-inertia run wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on centroid movement, relative to the mean
    /// per-feature variance of the data.
    pub tol: f64,
    pub seed: u64,
}

impl ClusteringParams {
    pub fn with_num_clusters(mut self, num_clusters: usize) -> Self {
        self.num_clusters = num_clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), AttributionError> {
        if self.num_clusters < 1 {
            return Err(AttributionError::InvalidClusters {
                num_clusters: self.num_clusters,
            });
        }
        if self.n_init < 1 {
            return Err(AttributionError::InvalidInit {
                n_init: self.n_init,
            });
        }
        if self.max_iter < 1 {
            return Err(AttributionError::InvalidMaxIter {
                max_iter: self.max_iter,
            });
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(AttributionError::InvalidTolerance { tol: self.tol });
        }
        Ok(())
    }
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            num_clusters: 5,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}
