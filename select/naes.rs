//! Naes selection: one representative per k-means cluster.

use crate::distance::{distances_to, euclidean};
use crate::error::SelectionError;
use crate::kmeans::kmeans;
use crate::matrix::check_sample_matrix;
use crate::projection::{ComponentSpec, PcaOptions, Projection};
use crate::result::SelectionResult;
use ndarray::{Array2, ArrayView2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Which member stands in for its cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentroidPolicy {
    /// The member closest to the cluster center.
    #[default]
    NearestToCentroid,
    /// The member farthest from the center of the whole data set.
    FarthestFromCenter,
    /// A uniformly drawn member.
    Random,
}

fn default_iter_max() -> usize {
    10
}

fn default_seed() -> u64 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NaesOptions {
    /// Number of clusters, and so of selected observations.
    pub k: usize,
    #[serde(default)]
    pub components: Option<ComponentSpec>,
    #[serde(default = "default_iter_max")]
    pub iter_max: usize,
    #[serde(default)]
    pub policy: CentroidPolicy,
    /// Seed for k-means++ and for the random policy.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub pca: PcaOptions,
}

impl NaesOptions {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            components: None,
            iter_max: default_iter_max(),
            policy: CentroidPolicy::default(),
            seed: default_seed(),
            pca: PcaOptions::default(),
        }
    }

    pub fn with_policy(mut self, policy: CentroidPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NaesResult {
    /// `model` holds one observation per non-empty cluster, by cluster id.
    pub selection: SelectionResult,
    pub cluster: Vec<usize>,
    pub centers: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
}

pub fn naes(x: ArrayView2<f64>, options: &NaesOptions) -> Result<NaesResult, SelectionError> {
    check_sample_matrix(x, 2)?;
    let n = x.nrows();
    if options.k == 0 {
        return Err(SelectionError::invalid("k must be at least 1"));
    }
    if options.iter_max == 0 {
        return Err(SelectionError::invalid("iter_max must be at least 1"));
    }
    let k = if options.k >= n {
        log::warn!("k = {} is not below the {n} observations; using k = {}", options.k, n - 1);
        n - 1
    } else {
        options.k
    };

    let (space, projection) = match options.components {
        Some(spec) => {
            let projection = Projection::fit(x, &options.pca, Some(spec))?;
            (projection.scores().clone(), Some(projection))
        }
        None => (x.to_owned(), None),
    };

    let mut rng = StdRng::seed_from_u64(options.seed);
    let clustering = kmeans(space.view(), k, options.iter_max, &mut rng);
    let members = clustering.members();

    let global_center = space
        .mean_axis(Axis(0))
        .ok_or_else(|| SelectionError::invalid("cannot compute the center of an empty matrix"))?;
    let from_center = distances_to(space.view(), global_center.view());

    let mut model = Vec::with_capacity(k);
    for (c, rows) in members.iter().enumerate() {
        if rows.is_empty() {
            log::warn!("Cluster {c} is empty and contributes no representative");
            continue;
        }
        let pick = match options.policy {
            CentroidPolicy::NearestToCentroid => {
                let centroid = clustering.centers.row(c);
                extreme_member(rows, |row| euclidean(space.row(row), centroid), false)
            }
            CentroidPolicy::FarthestFromCenter => {
                extreme_member(rows, |row| from_center[row], true)
            }
            CentroidPolicy::Random => rows.choose(&mut rng).copied(),
        };
        model.extend(pick);
    }

    log::info!(
        "Naes selected {} observations from {k} clusters ({} k-means iterations)",
        model.len(),
        clustering.iterations
    );
    Ok(NaesResult {
        selection: SelectionResult::from_model(n, model, projection),
        cluster: clustering.cluster,
        centers: clustering.centers,
        iterations: clustering.iterations,
        converged: clustering.converged,
    })
}

/// Member with the smallest (or largest) score; ties go to the lowest index.
fn extreme_member(rows: &[usize], score: impl Fn(usize) -> f64, largest: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &row in rows {
        let s = score(row);
        let better = match best {
            None => true,
            Some((_, top)) if largest => s > top,
            Some((_, top)) => s < top,
        };
        if better {
            best = Some((row, s));
        }
    }
    best.map(|(row, _)| row)
}
