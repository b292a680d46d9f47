//! Exact k-nearest-neighbour search.
//!
//! Brute force over all pairs, parallel across query points. Each query's
//! neighbour list is sorted by `(distance, index)`, so the result does not
//! depend on how rayon schedules the work.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::config::Metric;

/// Neighbour lists for every point, excluding the point itself.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KnnGraph {
    pub indices: Vec<Vec<usize>>,
    pub distances: Vec<Vec<f64>>,
}

impl KnnGraph {
    pub fn len(&self) -> usize {
        self.indices.len()
    }
}

pub(crate) fn distance(metric: Metric, a: &[f32], b: &[f32]) -> f64 {
    match metric {
        Metric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let d = f64::from(*x) - f64::from(*y);
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        Metric::Manhattan => a
            .iter()
            .zip(b)
            .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
            .sum(),
        Metric::Cosine => {
            let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
            for (x, y) in a.iter().zip(b) {
                let (x, y) = (f64::from(*x), f64::from(*y));
                dot += x * y;
                na += x * x;
                nb += y * y;
            }
            if na == 0.0 || nb == 0.0 {
                // Zero vectors have no direction.
                1.0
            } else {
                (1.0 - dot / (na.sqrt() * nb.sqrt())).max(0.0)
            }
        }
    }
}

/// Finds the `k` nearest neighbours of every row of `data`.
///
/// `k` must be smaller than `data.len()`.
pub(crate) fn nearest_neighbors(data: &[Vec<f32>], k: usize, metric: Metric) -> KnnGraph {
    let rows: Vec<(Vec<usize>, Vec<f64>)> = (0..data.len())
        .into_par_iter()
        .map(|i| {
            let mut candidates: Vec<(f64, usize)> = data
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, other)| (distance(metric, &data[i], other), j))
                .collect();
            candidates.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            candidates.truncate(k);
            candidates.into_iter().map(|(d, j)| (j, d)).unzip()
        })
        .collect();

    let (indices, distances) = rows.into_iter().unzip();
    KnnGraph { indices, distances }
}
