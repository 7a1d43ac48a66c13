use crate::distance::euclidean;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand::rngs::StdRng;

/// Sum of squared distances below which k-means++ falls back to a uniform
/// draw.
const SEEDING_EPS: f64 = 1e-12;

/// Result of Lloyd's k-means.
#[derive(Clone, Debug)]
pub struct KMeansResult {
    /// Cluster id of every row.
    pub cluster: Vec<usize>,
    /// Cluster centers (k x p).
    pub centers: Array2<f64>,
    pub iterations: usize,
    /// Whether assignments stopped changing before `iter_max`.
    pub converged: bool,
}

impl KMeansResult {
    /// Row indices of each cluster, ascending. Empty clusters yield empty
    /// lists.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.centers.nrows()];
        for (row, &c) in self.cluster.iter().enumerate() {
            members[c].push(row);
        }
        members
    }
}

/// k-means++ seeding followed by Lloyd iterations.
pub fn kmeans(x: ArrayView2<f64>, k: usize, iter_max: usize, rng: &mut StdRng) -> KMeansResult {
    let mut centers = seed_centers(x, k, rng);
    let mut cluster = assign(x, &centers);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < iter_max {
        iterations += 1;
        centers = recenter(x, &cluster, &centers);
        let next = assign(x, &centers);
        if next == cluster {
            converged = true;
            break;
        }
        cluster = next;
    }

    if !converged {
        log::warn!("k-means did not converge within {iter_max} iterations");
    }
    KMeansResult {
        cluster,
        centers,
        iterations,
        converged,
    }
}

/// Picks initial centers with probability proportional to the squared
/// distance to the nearest center chosen so far.
fn seed_centers(x: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = x.nrows();
    let mut chosen = vec![rng.gen_range(0..n)];

    while chosen.len() < k {
        let weights: Vec<f64> = x
            .axis_iter(Axis(0))
            .map(|row| {
                chosen
                    .iter()
                    .map(|&c| euclidean(row, x.row(c)))
                    .fold(f64::INFINITY, f64::min)
                    .powi(2)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        let next = if total < SEEDING_EPS {
            rng.gen_range(0..n)
        } else {
            let target = rng.gen_range(0.0..total);
            let mut running = 0.0;
            weights
                .iter()
                .position(|&w| {
                    running += w;
                    running > target
                })
                .unwrap_or(n - 1)
        };
        chosen.push(next);
    }

    x.select(Axis(0), &chosen)
}

fn nearest_center(row: ArrayView1<f64>, centers: &Array2<f64>) -> usize {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centers.axis_iter(Axis(0)).enumerate() {
        let d = euclidean(row, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best.0
}

fn assign(x: ArrayView2<f64>, centers: &Array2<f64>) -> Vec<usize> {
    x.axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| nearest_center(row, centers))
        .collect()
}

/// Cluster means; a cluster that lost all its members keeps its old center.
fn recenter(x: ArrayView2<f64>, cluster: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];
    for (row, &c) in x.axis_iter(Axis(0)).zip(cluster) {
        let mut slot = sums.row_mut(c);
        slot += &row;
        counts[c] += 1;
    }
    for (c, mut center) in sums.axis_iter_mut(Axis(0)).enumerate() {
        if counts[c] == 0 {
            center.assign(&previous.row(c));
        } else {
            center /= counts[c] as f64;
        }
    }
    sums
}
