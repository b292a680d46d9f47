//! Tunables for the projection strategies.
//!
//! Both parameter sets are plain data. Nothing here touches I/O, so a
//! projection is a pure function of `(embeddings, params)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProjectionError;

/// Distance used to build the neighbour graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            "manhattan" | "l1" => Ok(Metric::Manhattan),
            other => Err(ProjectionError::UnknownMetric(other.to_string())),
        }
    }
}

/// Parameters of the learned (manifold) projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionParams {
    /// Neighbourhood size, counting the point itself.
    ///
    /// Small values favour local structure, large values global structure.
    pub n_neighbors: usize,
    /// Minimum distance between embedded points. Lower packs clusters tighter.
    pub min_dist: f64,
    /// Scale of the embedded points; `min_dist` must not exceed it.
    pub spread: f64,
    pub metric: Metric,
    pub seed: u64,
    /// Optimisation epochs. `None` picks 500 for up to 10 000 points, 200 above.
    pub n_epochs: Option<usize>,
}

impl ReductionParams {
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = Some(n_epochs);
        self
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.n_neighbors < 2 {
            return Err(ProjectionError::InvalidNeighbors {
                n_neighbors: self.n_neighbors,
            });
        }
        if !self.spread.is_finite() || self.spread <= 0.0 {
            return Err(ProjectionError::InvalidSpread {
                spread: self.spread,
            });
        }
        if !self.min_dist.is_finite() || self.min_dist < 0.0 || self.min_dist > self.spread {
            return Err(ProjectionError::InvalidMinDist {
                min_dist: self.min_dist,
                spread: self.spread,
            });
        }
        if self.n_epochs == Some(0) {
            return Err(ProjectionError::InvalidEpochs);
        }
        Ok(())
    }

    /// Epoch count for a dataset of `n` points.
    pub fn epochs_for(&self, n: usize) -> usize {
        self.n_epochs
            .unwrap_or(if n <= 10_000 { 500 } else { 200 })
    }
}

impl Default for ReductionParams {
    fn default() -> Self {
        Self {
            n_neighbors: 10,
            min_dist: 0.1,
            spread: 1.0,
            metric: Metric::Cosine,
            seed: 42,
            n_epochs: None,
        }
    }
}

/// Parameters of the procedural sphere-shell placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellParams {
    /// Inner radius of the shell.
    pub base_radius: f64,
    /// Radial depth of the shell; points land in `[base, base + thickness]`.
    pub shell_thickness: f64,
    pub seed: u64,
}

impl ShellParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        if !self.base_radius.is_finite() || self.base_radius < 0.0 {
            return Err(ProjectionError::InvalidRadius {
                base_radius: self.base_radius,
            });
        }
        if !self.shell_thickness.is_finite() || self.shell_thickness < 0.0 {
            return Err(ProjectionError::InvalidThickness {
                shell_thickness: self.shell_thickness,
            });
        }
        Ok(())
    }

    pub fn outer_radius(&self) -> f64 {
        self.base_radius + self.shell_thickness
    }
}

impl Default for ShellParams {
    fn default() -> Self {
        Self {
            base_radius: 90.0,
            shell_thickness: 60.0,
            seed: 42,
        }
    }
}
