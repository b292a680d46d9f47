//! Neural Galaxy Spatial Projection
//!
//! Places every record somewhere in 3D. Two strategies share one trait:
//!
//! - [`LearnedProjection`] reduces the embeddings with a [`Reducer`]
//!   (by default the bundled [`NeighborGraphReducer`], a UMAP-style manifold
//!   layout) so that semantically close messages land close together. Its raw
//!   output has no fixed scale, so it asks for [`normalize_points`] afterwards.
//! - [`ShellPlacement`] ignores the embeddings and scatters points inside a
//!   spherical shell. Coordinates are final as produced.
//!
//! Both are deterministic for a fixed seed.
//!
//! ```
//! use projection::{ShellParams, ShellPlacement, SpatialStrategy};
//!
//! let shell = ShellPlacement::new(ShellParams::default()).unwrap();
//! let points = shell.project(3, None).unwrap();
//! assert!(points.iter().all(|p| p.radius() >= 90.0 && p.radius() <= 150.0));
//! ```

pub mod config;
pub mod error;
pub mod normalize;

mod fuzzy;
mod knn;
mod layout;
mod reducer;
mod shell;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use crate::config::{Metric, ReductionParams, ShellParams};
pub use crate::error::ProjectionError;
pub use crate::normalize::{normalize_points, Axis, AxisRange, NormalizationReport, DEFAULT_SCALE};
pub use crate::reducer::{NeighborGraphReducer, Reducer};
pub use crate::shell::ShellPlacement;

/// Seeds a generator for one named random stream.
///
/// Stages that share a user seed still read unrelated sequences, because the
/// stream tag is folded in through a splitmix64 finaliser.
pub(crate) fn stream_rng(seed: u64, stream: &[u8; 8]) -> fastrand::Rng {
    let mut z = seed ^ u64::from_le_bytes(*stream).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    fastrand::Rng::with_seed(z ^ (z >> 31))
}

/// A position in the galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpatialPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance from the origin.
    pub fn radius(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for SpatialPoint {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Assigns a 3D position to each of `count` records.
pub trait SpatialStrategy: Send + Sync {
    /// Returns exactly `count` points in record order.
    ///
    /// Strategies that need embeddings fail when `embeddings` is `None` or
    /// holds a different number of vectors.
    fn project(
        &self,
        count: usize,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Vec<SpatialPoint>, ProjectionError>;

    /// Whether the output must go through [`normalize_points`] before export.
    fn requires_normalization(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Projection learned from the embeddings themselves.
pub struct LearnedProjection {
    reducer: Box<dyn Reducer>,
    params: ReductionParams,
}

impl LearnedProjection {
    pub fn new(params: ReductionParams) -> Result<Self, ProjectionError> {
        Self::with_reducer(NeighborGraphReducer::default(), params)
    }

    pub fn with_reducer(
        reducer: impl Reducer + 'static,
        params: ReductionParams,
    ) -> Result<Self, ProjectionError> {
        params.validate()?;
        Ok(Self {
            reducer: Box::new(reducer),
            params,
        })
    }

    pub fn params(&self) -> &ReductionParams {
        &self.params
    }
}

impl std::fmt::Debug for LearnedProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearnedProjection")
            .field("reducer", &self.reducer.name())
            .field("params", &self.params)
            .finish()
    }
}

impl SpatialStrategy for LearnedProjection {
    fn project(
        &self,
        count: usize,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Vec<SpatialPoint>, ProjectionError> {
        let embeddings = embeddings.ok_or(ProjectionError::MissingEmbeddings {
            strategy: self.name(),
        })?;
        if embeddings.len() != count {
            return Err(ProjectionError::CountMismatch {
                expected: count,
                actual: embeddings.len(),
            });
        }

        let raw = self.reducer.reduce(embeddings, &self.params)?;
        if raw.len() != count {
            return Err(ProjectionError::CountMismatch {
                expected: count,
                actual: raw.len(),
            });
        }
        info!(reducer = self.reducer.name(), count, "learned_projection_complete");
        Ok(raw.into_iter().map(SpatialPoint::from).collect())
    }

    fn requires_normalization(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "learned"
    }
}
