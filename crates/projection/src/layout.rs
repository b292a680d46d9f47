//! Low-dimensional layout optimisation.
//!
//! The embedded similarity between two points at distance `d` is modelled as
//! `1 / (1 + a * d^(2b))`. `(a, b)` are fitted once from `min_dist`/`spread`,
//! then stochastic gradient descent pulls graph neighbours together and pushes
//! randomly sampled points apart.

const CURVE_SAMPLES: usize = 300;
const GRADIENT_CLIP: f64 = 4.0;
const MAX_REFINE_ROUNDS: usize = 20_000;

/// Fits `(a, b)` so that `1 / (1 + a x^(2b))` approximates
/// `1` for `x < min_dist` and `exp(-(x - min_dist) / spread)` beyond.
pub(crate) fn find_ab_params(spread: f64, min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (0..CURVE_SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (CURVE_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let loss = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let r = 1.0 / (1.0 + a * x.powf(2.0 * b)) - y;
                r * r
            })
            .sum()
    };

    // Coarse grid: log-spaced a, linear b.
    let (mut best_a, mut best_b, mut best) = (1.0, 1.0, f64::INFINITY);
    for ai in 0..60 {
        let a = 10f64.powf(-2.0 + 4.0 * ai as f64 / 59.0);
        for bi in 0..40 {
            let b = 0.1 + 1.9 * bi as f64 / 39.0;
            let l = loss(a, b);
            if l < best {
                (best_a, best_b, best) = (a, b, l);
            }
        }
    }

    // Pattern search refinement.
    let (mut step_a, mut step_b) = (best_a * 0.5, 0.05);
    let mut rounds = 0;
    while (step_a > 1e-10 || step_b > 1e-10) && rounds < MAX_REFINE_ROUNDS {
        rounds += 1;
        let mut improved = false;
        for (da, db) in [(step_a, 0.0), (-step_a, 0.0), (0.0, step_b), (0.0, -step_b)] {
            let (a, b) = (best_a + da, best_b + db);
            if a <= 0.0 || b <= 0.0 {
                continue;
            }
            let l = loss(a, b);
            if l < best {
                (best_a, best_b, best) = (a, b, l);
                improved = true;
            }
        }
        if !improved {
            step_a *= 0.5;
            step_b *= 0.5;
        }
    }

    (best_a, best_b)
}

/// Knobs of the stochastic optimisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SgdSettings {
    pub a: f64,
    pub b: f64,
    pub n_epochs: usize,
    pub learning_rate: f64,
    pub negative_sample_rate: usize,
    pub repulsion_strength: f64,
}

fn clip(value: f64) -> f64 {
    value.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (0..3).map(|d| (a[d] - b[d]).powi(2)).sum()
}

/// Optimises `embedding` in place over the weighted edge list.
///
/// `edges` lists each undirected edge once; both directions are sampled, so
/// every endpoint gets its own negative samples regardless of index order.
/// Edges lighter than `max_weight / n_epochs` would never be sampled and are
/// skipped. Heavier edges are sampled proportionally to their weight.
pub(crate) fn optimize_layout(
    embedding: &mut [[f64; 3]],
    edges: &[(usize, usize, f64)],
    settings: &SgdSettings,
    rng: &mut fastrand::Rng,
) {
    let n = embedding.len();
    if n < 2 || edges.is_empty() || settings.n_epochs == 0 {
        return;
    }

    let n_epochs = settings.n_epochs as f64;
    let max_weight = edges.iter().map(|e| e.2).fold(0.0f64, f64::max);
    let active: Vec<(usize, usize, f64)> = edges
        .iter()
        .filter(|e| e.2 >= max_weight / n_epochs)
        .flat_map(|&(i, j, w)| [(i, j, w), (j, i, w)])
        .collect();

    let epochs_per_sample: Vec<f64> = active.iter().map(|e| max_weight / e.2).collect();
    let neg_rate = settings.negative_sample_rate.max(1) as f64;
    let epochs_per_negative: Vec<f64> = epochs_per_sample.iter().map(|e| e / neg_rate).collect();
    let mut next_sample = epochs_per_sample.clone();
    let mut next_negative = epochs_per_negative.clone();

    let (a, b) = (settings.a, settings.b);
    let gamma = settings.repulsion_strength;

    for epoch in 0..settings.n_epochs {
        let e = epoch as f64;
        let alpha = settings.learning_rate * (1.0 - e / n_epochs);

        for (edge, &(head, tail, _)) in active.iter().enumerate() {
            if next_sample[edge] > e {
                continue;
            }

            let dist_sq = squared_distance(&embedding[head], &embedding[tail]);
            let attract = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..3 {
                let grad = clip(attract * (embedding[head][d] - embedding[tail][d])) * alpha;
                embedding[head][d] += grad;
                embedding[tail][d] -= grad;
            }
            next_sample[edge] += epochs_per_sample[edge];

            let n_negative = ((e - next_negative[edge]) / epochs_per_negative[edge]).max(0.0) as usize;
            for _ in 0..n_negative {
                let other = rng.usize(..n);
                if other == head {
                    continue;
                }
                let dist_sq = squared_distance(&embedding[head], &embedding[other]);
                for d in 0..3 {
                    // Coincident points get a full-strength push.
                    let grad = if dist_sq > 0.0 {
                        let repel =
                            2.0 * gamma * b / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0));
                        clip(repel * (embedding[head][d] - embedding[other][d]))
                    } else {
                        GRADIENT_CLIP
                    };
                    embedding[head][d] += grad * alpha;
                }
            }
            next_negative[edge] += n_negative as f64 * epochs_per_negative[edge];
        }
    }
}
