//! k-means with k-means++ seeding.
//!
//! Each restart seeds centroids with k-means++, then runs Lloyd iterations
//! until the total squared centroid shift drops below `tol * mean variance`
//! or `max_iter` is reached. All restarts draw from one seeded generator, so
//! the winning labelling is reproducible.

use tracing::{debug, warn};

use crate::config::ClusteringParams;
use crate::{stream_rng, AttributionError};

/// Partitions vectors into groups.
pub trait Clusterer: Send + Sync {
    /// Returns one label in `[0, k)` per row of `data`, in row order.
    fn cluster(&self, data: &[Vec<f32>], k: usize, seed: u64)
        -> Result<Vec<usize>, AttributionError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
}

/// Outcome of the best restart.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::from_params(&ClusteringParams::default())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the closest centroid; ties go to the lower index.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (k, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (k, d);
        }
    }
    best
}

pub(crate) fn check_matrix(data: &[Vec<f32>]) -> Result<usize, AttributionError> {
    let Some(first) = data.first() else {
        return Ok(0);
    };
    let dim = first.len();
    if dim == 0 {
        return Err(AttributionError::EmptyVector);
    }
    for (index, row) in data.iter().enumerate() {
        if row.len() != dim {
            return Err(AttributionError::DimensionMismatch {
                index,
                expected: dim,
                actual: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(AttributionError::NonFiniteInput { index });
        }
    }
    Ok(dim)
}

impl KMeans {
    pub fn from_params(params: &ClusteringParams) -> Self {
        Self {
            n_init: params.n_init,
            max_iter: params.max_iter,
            tol: params.tol,
        }
    }

    fn init_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut centroids = Vec::with_capacity(k);
        centroids.push(points[rng.usize(..n)].clone());
        let mut closest: Vec<f64> = points
            .iter()
            .map(|p| squared_distance(p, &centroids[0]))
            .collect();

        while centroids.len() < k {
            let total: f64 = closest.iter().sum();
            let chosen = if total > 0.0 {
                let target = rng.f64() * total;
                let mut acc = 0.0;
                let mut pick = n - 1;
                for (i, d) in closest.iter().enumerate() {
                    acc += d;
                    if acc > target {
                        pick = i;
                        break;
                    }
                }
                pick
            } else {
                rng.usize(..n)
            };
            let centroid = points[chosen].clone();
            for (i, p) in points.iter().enumerate() {
                closest[i] = closest[i].min(squared_distance(p, &centroid));
            }
            centroids.push(centroid);
        }
        centroids
    }

    fn lloyd(&self, points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, tol: f64) -> KMeansFit {
        let (n, k, dim) = (points.len(), centroids.len(), points[0].len());
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let mut distances = vec![0.0f64; n];
            for (i, p) in points.iter().enumerate() {
                let (label, d) = nearest(p, &centroids);
                labels[i] = label;
                distances[i] = d;
            }

            let mut sums = vec![vec![0.0f64; dim]; k];
            let mut counts = vec![0usize; k];
            for (p, &label) in points.iter().zip(&labels) {
                counts[label] += 1;
                for (s, v) in sums[label].iter_mut().zip(p) {
                    *s += v;
                }
            }

            // Empty clusters take over the point worst served by its centroid.
            for cluster in 0..k {
                if counts[cluster] > 0 {
                    continue;
                }
                let far = distances
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, d)| if *d > distances[best] { i } else { best });
                let old = labels[far];
                if counts[old] > 1 {
                    counts[old] -= 1;
                    for (s, v) in sums[old].iter_mut().zip(&points[far]) {
                        *s -= v;
                    }
                    labels[far] = cluster;
                    counts[cluster] = 1;
                    sums[cluster] = points[far].clone();
                    distances[far] = 0.0;
                }
            }

            let mut shift = 0.0;
            for cluster in 0..k {
                if counts[cluster] == 0 {
                    continue;
                }
                let updated: Vec<f64> = sums[cluster]
                    .iter()
                    .map(|s| s / counts[cluster] as f64)
                    .collect();
                shift += squared_distance(&updated, &centroids[cluster]);
                centroids[cluster] = updated;
            }

            if shift <= tol {
                break;
            }
        }

        let mut inertia = 0.0;
        for (i, p) in points.iter().enumerate() {
            let (label, d) = nearest(p, &centroids);
            labels[i] = label;
            inertia += d;
        }

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }

    /// Runs all restarts and returns the lowest-inertia fit.
    ///
    /// `k` is clamped to the number of rows.
    pub fn fit(&self, data: &[Vec<f32>], k: usize, seed: u64) -> Result<KMeansFit, AttributionError> {
        if k < 1 {
            return Err(AttributionError::InvalidClusters { num_clusters: k });
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
        let dim = check_matrix(data)?;
        let n = data.len();
        if n == 0 {
            return Ok(KMeansFit {
                labels: Vec::new(),
                centroids: Vec::new(),
                inertia: 0.0,
                iterations: 0,
            });
        }

        let k = if k > n {
            warn!(requested = k, points = n, "num_clusters exceeds point count, clamping");
            n
        } else {
            k
        };

        let points: Vec<Vec<f64>> = data
            .iter()
            .map(|row| row.iter().map(|v| f64::from(*v)).collect())
            .collect();

        let mean_variance = (0..dim)
            .map(|d| {
                let mean = points.iter().map(|p| p[d]).sum::<f64>() / n as f64;
                points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n as f64
            })
            .sum::<f64>()
            / dim as f64;
        let tol = self.tol * mean_variance;

        let mut rng = stream_rng(seed, b"kmeans\0\0");
        let mut best: Option<KMeansFit> = None;
        for run in 0..self.n_init {
            let centroids = Self::init_plus_plus(&points, k, &mut rng);
            let fit = self.lloyd(&points, centroids, tol);
            debug!(run, inertia = fit.inertia, iterations = fit.iterations, "kmeans_run");
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        Ok(best.unwrap_or(KMeansFit {
            labels: vec![0; n],
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        }))
    }
}

impl Clusterer for KMeans {
    fn cluster(
        &self,
        data: &[Vec<f32>],
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, AttributionError> {
        self.fit(data, k, seed).map(|fit| fit.labels)
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}
