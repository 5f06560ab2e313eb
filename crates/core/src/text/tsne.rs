//! Exact t-SNE for small document sets.
//!
//! Conditional probabilities are calibrated per point by binary search on
//! the Gaussian precision, symmetrized, then matched by a Student-t
//! embedding using gradient descent with momentum and adaptive gains.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CoreError;

/// Floor for joint probabilities.
const MIN_PROBABILITY: f64 = 1e-12;
/// Entropy tolerance for the perplexity search.
const ENTROPY_TOLERANCE: f64 = 1e-5;
const BINARY_SEARCH_STEPS: usize = 100;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
const MIN_GAIN: f64 = 0.01;
/// Standard deviation of the random initial layout.
const INIT_SCALE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct TsneParams {
    /// Effective number of neighbours; must be positive and below the number
    /// of points.
    pub perplexity: f64,
    /// `None` selects `max(n / early_exaggeration / 4, 50)`.
    pub learning_rate: Option<f64>,
    pub n_iter: usize,
    pub early_exaggeration: f64,
    pub exaggeration_iters: usize,
    pub seed: u64,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            learning_rate: None,
            n_iter: 1000,
            early_exaggeration: 12.0,
            exaggeration_iters: 250,
            seed: 42,
        }
    }
}

fn squared_distances(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut d = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dist: f64 = points[i]
                .iter()
                .zip(&points[j])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            d[i][j] = dist;
            d[j][i] = dist;
        }
    }
    d
}

/// Row `i` of the conditional probability matrix for a target entropy.
fn conditional_row(distances: &[f64], i: usize, target_entropy: f64) -> Vec<f64> {
    let mut beta = 1.0;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut row = vec![0.0; distances.len()];

    for _ in 0..BINARY_SEARCH_STEPS {
        for (j, p) in row.iter_mut().enumerate() {
            *p = if j == i { 0.0 } else { (-distances[j] * beta).exp() };
        }
        let mut sum: f64 = row.iter().sum();
        if sum == 0.0 {
            sum = 1e-8;
        }
        row.iter_mut().for_each(|p| *p /= sum);
        let weighted: f64 = row.iter().zip(distances).map(|(p, d)| p * d).sum();
        let entropy = sum.ln() + beta * weighted;

        let diff = entropy - target_entropy;
        if diff.abs() <= ENTROPY_TOLERANCE {
            break;
        }
        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
        }
    }
    row
}

fn joint_probabilities(points: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = points.len();
    let distances = squared_distances(points);
    let target = perplexity.ln();
    let conditional: Vec<Vec<f64>> = (0..n)
        .map(|i| conditional_row(&distances[i], i, target))
        .collect();

    let mut p = vec![vec![0.0; n]; n];
    let total: f64 = conditional.iter().flatten().sum::<f64>() * 2.0;
    let total = if total > 0.0 { total } else { 1.0 };
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i][j] = ((conditional[i][j] + conditional[j][i]) / total).max(MIN_PROBABILITY);
            }
        }
    }
    p
}

/// Box-Muller standard normal sample.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Embed `points` into two dimensions. The result is centred on the origin.
pub fn tsne_embed(points: &[Vec<f64>], params: &TsneParams) -> Result<Vec<(f64, f64)>, CoreError> {
    let n = points.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if n == 1 {
        return Ok(vec![(0.0, 0.0)]);
    }
    let dims = points[0].len();
    if points.iter().any(|p| p.len() != dims) {
        return Err(CoreError::Validation(
            "All vectors must have the same dimension".to_string(),
        ));
    }
    if !(params.perplexity > 0.0 && params.perplexity < n as f64) {
        return Err(CoreError::Validation(format!(
            "Perplexity must be positive and less than the number of samples ({n})"
        )));
    }

    let p = joint_probabilities(points, params.perplexity);
    let learning_rate = params
        .learning_rate
        .unwrap_or_else(|| (n as f64 / params.early_exaggeration / 4.0).max(50.0));

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut y: Vec<[f64; 2]> = (0..n)
        .map(|_| [gaussian(&mut rng) * INIT_SCALE, gaussian(&mut rng) * INIT_SCALE])
        .collect();
    let mut update = vec![[0.0f64; 2]; n];
    let mut gains = vec![[1.0f64; 2]; n];
    let mut num = vec![vec![0.0; n]; n];
    let mut grad = vec![[0.0f64; 2]; n];

    for iter in 0..params.n_iter {
        let exaggerating = iter < params.exaggeration_iters;
        let exaggeration = if exaggerating { params.early_exaggeration } else { 1.0 };
        let momentum = if exaggerating { INITIAL_MOMENTUM } else { FINAL_MOMENTUM };

        let mut sum_num = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                let q = 1.0 / (1.0 + dx * dx + dy * dy);
                num[i][j] = q;
                num[j][i] = q;
                sum_num += 2.0 * q;
            }
        }
        let sum_num = sum_num.max(MIN_PROBABILITY);

        for i in 0..n {
            let mut g = [0.0; 2];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let q = (num[i][j] / sum_num).max(MIN_PROBABILITY);
                let coeff = 4.0 * (exaggeration * p[i][j] - q) * num[i][j];
                g[0] += coeff * (y[i][0] - y[j][0]);
                g[1] += coeff * (y[i][1] - y[j][1]);
            }
            grad[i] = g;
        }

        for i in 0..n {
            for k in 0..2 {
                let gain = &mut gains[i][k];
                if update[i][k] * grad[i][k] < 0.0 {
                    *gain += 0.2;
                } else {
                    *gain *= 0.8;
                }
                *gain = gain.max(MIN_GAIN);
                update[i][k] = momentum * update[i][k] - learning_rate * *gain * grad[i][k];
                y[i][k] += update[i][k];
            }
        }
    }

    let cx = y.iter().map(|p| p[0]).sum::<f64>() / n as f64;
    let cy = y.iter().map(|p| p[1]).sum::<f64>() / n as f64;
    Ok(y.into_iter().map(|p| (p[0] - cx, p[1] - cy)).collect())
}
