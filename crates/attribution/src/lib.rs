//! Neural Galaxy Categorical Attribution
//!
//! Gives every record a display color and a display size.
//!
//! Colors come from a [`ColorStrategy`]:
//!
//! - [`ClusterColoring`] groups the embeddings with a [`Clusterer`] (bundled:
//!   [`KMeans`]) and paints cluster `k` with `palette[k % len]`.
//! - [`RandomColoring`] draws each color independently from the palette.
//!
//! Sizes come from [`SizeBuckets`], a pure function of the word count.
//!
//! ```
//! use attribution::{ColorStrategy, Palette, RandomColoring};
//!
//! let coloring = RandomColoring::new(Palette::default(), 42);
//! let attribution = coloring.attribute(4, None).unwrap();
//! assert_eq!(attribution.colors.len(), 4);
//! assert!(attribution.clusters.is_none());
//! ```

pub mod config;
pub mod error;
pub mod kmeans;
pub mod palette;
pub mod size;

use serde::Serialize;
use tracing::info;

pub use crate::config::ClusteringParams;
pub use crate::error::AttributionError;
pub use crate::kmeans::{Clusterer, KMeans, KMeansFit};
pub use crate::palette::{Color, Palette, DEFAULT_PALETTE};
pub use crate::size::{
    word_count, SizeBuckets, SizeClass, LARGE_MIN_WORDS_ALTERNATE, LARGE_MIN_WORDS_DEFAULT,
    MEDIUM_MIN_WORDS_DEFAULT,
};

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

/// Colors for every record, plus cluster labels when the strategy has them.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub colors: Vec<Color>,
    pub clusters: Option<Vec<usize>>,
}

/// Population of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    pub color: Color,
}

impl Attribution {
    /// Per-cluster sizes in cluster order. Empty without cluster labels.
    pub fn cluster_summary(&self, palette: &Palette) -> Vec<ClusterSummary> {
        let Some(labels) = &self.clusters else {
            return Vec::new();
        };
        let k = labels.iter().max().map_or(0, |m| m + 1);
        let mut sizes = vec![0usize; k];
        for &label in labels {
            sizes[label] += 1;
        }
        sizes
            .into_iter()
            .enumerate()
            .map(|(cluster, size)| ClusterSummary {
                cluster,
                size,
                color: palette.color_for_cluster(cluster).clone(),
            })
            .collect()
    }
}

/// Assigns a color to each of `count` records.
pub trait ColorStrategy: Send + Sync {
    /// Returns exactly `count` colors in record order.
    fn attribute(
        &self,
        count: usize,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Attribution, AttributionError>;

    fn palette(&self) -> &Palette;

    fn name(&self) -> &'static str;
}

/// Colors by semantic cluster.
pub struct ClusterColoring {
    clusterer: Box<dyn Clusterer>,
    num_clusters: usize,
    seed: u64,
    palette: Palette,
}

impl ClusterColoring {
    pub fn new(params: &ClusteringParams, palette: Palette) -> Result<Self, AttributionError> {
        Self::with_clusterer(KMeans::from_params(params), params, palette)
    }

    pub fn with_clusterer(
        clusterer: impl Clusterer + 'static,
        params: &ClusteringParams,
        palette: Palette,
    ) -> Result<Self, AttributionError> {
        params.validate()?;
        Ok(Self {
            clusterer: Box::new(clusterer),
            num_clusters: params.num_clusters,
            seed: params.seed,
            palette,
        })
    }
}

impl std::fmt::Debug for ClusterColoring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterColoring")
            .field("clusterer", &self.clusterer.name())
            .field("num_clusters", &self.num_clusters)
            .field("seed", &self.seed)
            .finish()
    }
}

impl ColorStrategy for ClusterColoring {
    fn attribute(
        &self,
        count: usize,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Attribution, AttributionError> {
        let embeddings = embeddings.ok_or(AttributionError::MissingEmbeddings {
            strategy: self.name(),
        })?;
        if embeddings.len() != count {
            return Err(AttributionError::CountMismatch {
                expected: count,
                actual: embeddings.len(),
            });
        }

        let labels = self
            .clusterer
            .cluster(embeddings, self.num_clusters, self.seed)?;
        if labels.len() != count {
            return Err(AttributionError::CountMismatch {
                expected: count,
                actual: labels.len(),
            });
        }
        let colors = labels
            .iter()
            .map(|&k| self.palette.color_for_cluster(k).clone())
            .collect();

        let attribution = Attribution {
            colors,
            clusters: Some(labels),
        };
        for summary in attribution.cluster_summary(&self.palette) {
            info!(
                cluster = summary.cluster,
                size = summary.size,
                color = %summary.color,
                "cluster_size"
            );
        }
        Ok(attribution)
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn name(&self) -> &'static str {
        "cluster"
    }
}

/// Colors drawn uniformly at random from the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomColoring {
    palette: Palette,
    seed: u64,
}

impl RandomColoring {
    pub fn new(palette: Palette, seed: u64) -> Self {
        Self { palette, seed }
    }
}

impl ColorStrategy for RandomColoring {
    fn attribute(
        &self,
        count: usize,
        _embeddings: Option<&[Vec<f32>]>,
    ) -> Result<Attribution, AttributionError> {
        let mut rng = stream_rng(self.seed, b"colors\0\0");
        let colors = (0..count)
            .map(|_| self.palette.sample(&mut rng).clone())
            .collect();
        info!(count, palette = self.palette.len(), "random_coloring_complete");
        Ok(Attribution {
            colors,
            clusters: None,
        })
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
