//! Fuzzy neighbourhood graph construction.
//!
//! Every point gets a local bandwidth so that its neighbourhood carries the
//! same total membership, then the directed memberships are merged into one
//! symmetric weighted graph with the probabilistic union `a + b - ab`.

use std::collections::BTreeMap;

use crate::knn::KnnGraph;

const BANDWIDTH_ITERATIONS: usize = 64;
const BANDWIDTH_TOLERANCE: f64 = 1e-5;
const MIN_BANDWIDTH_SCALE: f64 = 1e-3;

/// Per-point distance to the nearest distinct neighbour (`rho`) and smoothing
/// bandwidth (`sigma`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bandwidths {
    pub rhos: Vec<f64>,
    pub sigmas: Vec<f64>,
}

/// Binary search for each `sigma` so that
/// `sum_j exp(-max(0, d_j - rho) / sigma) == log2(n_neighbors)`.
pub(crate) fn smooth_knn_dist(knn: &KnnGraph, n_neighbors: usize) -> Bandwidths {
    let target = (n_neighbors as f64).log2();
    let all: Vec<f64> = knn.distances.iter().flatten().copied().collect();
    let global_mean = if all.is_empty() {
        0.0
    } else {
        all.iter().sum::<f64>() / all.len() as f64
    };

    let mut rhos = Vec::with_capacity(knn.len());
    let mut sigmas = Vec::with_capacity(knn.len());

    for distances in &knn.distances {
        let rho = distances.iter().copied().find(|d| *d > 0.0).unwrap_or(0.0);

        let (mut lo, mut hi, mut mid) = (0.0f64, f64::INFINITY, 1.0f64);
        for _ in 0..BANDWIDTH_ITERATIONS {
            let psum: f64 = distances
                .iter()
                .map(|d| {
                    let shifted = d - rho;
                    if shifted > 0.0 {
                        (-shifted / mid).exp()
                    } else {
                        1.0
                    }
                })
                .sum();

            if (psum - target).abs() < BANDWIDTH_TOLERANCE {
                break;
            }
            if psum > target {
                hi = mid;
                mid = (lo + hi) / 2.0;
            } else {
                lo = mid;
                mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
            }
        }

        let local_mean = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let floor = if rho > 0.0 {
            MIN_BANDWIDTH_SCALE * local_mean
        } else {
            MIN_BANDWIDTH_SCALE * global_mean
        };
        rhos.push(rho);
        sigmas.push(mid.max(floor).max(f64::MIN_POSITIVE));
    }

    Bandwidths { rhos, sigmas }
}

/// Symmetric weighted edge list `(i, j, weight)` with `i < j`, in ascending
/// `(i, j)` order.
pub(crate) fn fuzzy_union(knn: &KnnGraph, bandwidths: &Bandwidths) -> Vec<(usize, usize, f64)> {
    let mut directed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, (neighbors, distances)) in knn.indices.iter().zip(&knn.distances).enumerate() {
        let (rho, sigma) = (bandwidths.rhos[i], bandwidths.sigmas[i]);
        for (&j, &d) in neighbors.iter().zip(distances) {
            let shifted = d - rho;
            let weight = if shifted <= 0.0 {
                1.0
            } else {
                (-shifted / sigma).exp()
            };
            directed.insert((i, j), weight);
        }
    }

    let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w) in &directed {
        let key = (i.min(j), i.max(j));
        if merged.contains_key(&key) {
            continue;
        }
        let reverse = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let combined = w + reverse - w * reverse;
        if combined > 0.0 {
            merged.insert(key, combined);
        }
    }

    merged.into_iter().map(|((i, j), w)| (i, j, w)).collect()
}
