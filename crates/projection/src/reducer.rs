use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ReductionParams;
use crate::fuzzy::{fuzzy_union, smooth_knn_dist};
use crate::knn::nearest_neighbors;
use crate::layout::{find_ab_params, optimize_layout, SgdSettings};
use crate::{stream_rng, ProjectionError};

const INIT_RANGE: f64 = 10.0;

/// Maps an `N x D` batch of vectors to `N` points in 3D.
///
/// Implementations must be deterministic for fixed input, params and seed.
pub trait Reducer: Send + Sync {
    fn reduce(
        &self,
        data: &[Vec<f32>],
        params: &ReductionParams,
    ) -> Result<Vec<[f64; 3]>, ProjectionError>;

    fn name(&self) -> &'static str;
}

/// Manifold layout in the UMAP family.
///
/// 1. exact kNN graph under the configured metric
/// 2. per-point bandwidth calibration and fuzzy union into a weighted graph
/// 3. seeded uniform initialisation in `[-10, 10]^3`
/// 4. seeded SGD with negative sampling
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborGraphReducer {
    pub learning_rate: f64,
    pub negative_sample_rate: usize,
    pub repulsion_strength: f64,
}

impl Default for NeighborGraphReducer {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            negative_sample_rate: 5,
            repulsion_strength: 1.0,
        }
    }
}

/// Checks that `data` is a non-ragged matrix of finite values and returns its
/// column count.
pub(crate) fn check_matrix(data: &[Vec<f32>]) -> Result<usize, ProjectionError> {
    let Some(first) = data.first() else {
        return Ok(0);
    };
    let dim = first.len();
    if dim == 0 {
        return Err(ProjectionError::EmptyVector);
    }
    for (index, row) in data.iter().enumerate() {
        if row.len() != dim {
            return Err(ProjectionError::DimensionMismatch {
                index,
                expected: dim,
                actual: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ProjectionError::NonFiniteInput { index });
        }
    }
    Ok(dim)
}

impl Reducer for NeighborGraphReducer {
    fn reduce(
        &self,
        data: &[Vec<f32>],
        params: &ReductionParams,
    ) -> Result<Vec<[f64; 3]>, ProjectionError> {
        params.validate()?;
        let dim = check_matrix(data)?;
        let n = data.len();
        match n {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![[0.0; 3]]),
            _ => {}
        }

        let start = Instant::now();
        let n_neighbors = if params.n_neighbors > n {
            warn!(
                requested = params.n_neighbors,
                points = n,
                "n_neighbors exceeds point count, clamping"
            );
            n
        } else {
            params.n_neighbors
        };

        let knn = nearest_neighbors(data, n_neighbors - 1, params.metric);
        let bandwidths = smooth_knn_dist(&knn, n_neighbors);
        let edges = fuzzy_union(&knn, &bandwidths);
        let (a, b) = find_ab_params(params.spread, params.min_dist);
        debug!(
            points = n,
            dim,
            edges = edges.len(),
            a,
            b,
            elapsed_micros = start.elapsed().as_micros(),
            "neighbor_graph_built"
        );

        let mut rng = stream_rng(params.seed, b"layout\0\0");
        let mut embedding: Vec<[f64; 3]> = (0..n)
            .map(|_| {
                [
                    rng.f64() * 2.0 * INIT_RANGE - INIT_RANGE,
                    rng.f64() * 2.0 * INIT_RANGE - INIT_RANGE,
                    rng.f64() * 2.0 * INIT_RANGE - INIT_RANGE,
                ]
            })
            .collect();

        let settings = SgdSettings {
            a,
            b,
            n_epochs: params.epochs_for(n),
            learning_rate: self.learning_rate,
            negative_sample_rate: self.negative_sample_rate,
            repulsion_strength: self.repulsion_strength,
        };
        optimize_layout(&mut embedding, &edges, &settings, &mut rng);

        if let Some(index) = embedding
            .iter()
            .position(|p| p.iter().any(|v| !v.is_finite()))
        {
            return Err(ProjectionError::NonFiniteOutput { index });
        }

        info!(
            points = n,
            n_neighbors,
            metric = %params.metric,
            n_epochs = settings.n_epochs,
            elapsed_micros = start.elapsed().as_micros(),
            "reduction_complete"
        );
        Ok(embedding)
    }

    fn name(&self) -> &'static str {
        "neighbor_graph"
    }
}
