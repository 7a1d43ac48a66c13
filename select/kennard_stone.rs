//! Kennard-Stone (CADEX) selection.
//!
//! Starting from the two most distant observations (or a caller supplied
//! seed set), the observation whose nearest selected neighbour is farthest
//! away is added until `k` observations are selected. The result spreads
//! uniformly over the data cloud and always contains its extremes.

use crate::distance::{DistanceMatrix, Metric, NearestSelected, metric_space};
use crate::error::SelectionError;
use crate::group::{GroupPartition, expand_or_single};
use crate::matrix::{check_sample_matrix, complement};
use crate::projection::{ComponentSpec, PcaOptions};
use crate::result::SelectionResult;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KennardStoneOptions {
    /// Number of observations to select.
    pub k: usize,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub components: Option<ComponentSpec>,
    #[serde(default)]
    pub pca: PcaOptions,
}

impl KennardStoneOptions {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: Metric::default(),
            components: None,
            pca: PcaOptions::default(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_components(mut self, components: ComponentSpec) -> Self {
        self.components = Some(components);
        self
    }
}

/// Selects `options.k` observations by the max-min criterion.
///
/// With a `group` partition every pick brings its whole group along, which
/// can push the selection past `k` by up to one group's size minus one.
/// With `init`, those indices seed the selection in the given order and the
/// farthest-pair search is skipped.
pub fn kennard_stone(
    x: ArrayView2<f64>,
    options: &KennardStoneOptions,
    group: Option<&GroupPartition>,
    init: Option<&[usize]>,
) -> Result<SelectionResult, SelectionError> {
    check_sample_matrix(x, 2)?;
    let n = x.nrows();
    if options.k < 2 {
        return Err(SelectionError::invalid(format!(
            "k must be at least 2, got {}",
            options.k
        )));
    }
    if x.ncols() < 2 {
        return Err(SelectionError::invalid(
            "the sample matrix must have at least 2 columns",
        ));
    }
    if let Some(partition) = group {
        partition.check_rows(n)?;
    }
    if let Some(seeds) = init {
        check_seeds(seeds, n)?;
    }
    let k = if options.k >= n {
        log::warn!("k = {} is not below the {n} observations; using k = {}", options.k, n - 1);
        n - 1
    } else {
        options.k
    };

    let (coords, projection) = metric_space(x, options.metric, options.components, &options.pca)?;
    let distances = DistanceMatrix::new(coords.view());

    let seeds: Vec<usize> = match init {
        Some(seeds) => seeds.to_vec(),
        None => {
            let (i, j) = distances
                .farthest_pair()
                .ok_or_else(|| SelectionError::invalid("no pair of observations to compare"))?;
            vec![i, j]
        }
    };

    let mut model: Vec<usize> = Vec::with_capacity(k);
    for seed in seeds {
        for member in expand_or_single(group, seed) {
            if !model.contains(&member) {
                model.push(member);
            }
        }
    }

    let mut tracker = NearestSelected::new(complement(n, &model), &model, &distances);
    log::debug!(
        "Kennard-Stone seeded with {} observations, {} remain in the pool",
        model.len(),
        tracker.len()
    );

    while model.len() < k {
        let Some((pick, spread)) = tracker.farthest() else {
            break;
        };
        let members = expand_or_single(group, pick);
        tracker.remove(&members);
        for &member in &members {
            tracker.absorb(member, &distances);
        }
        log::trace!("Selected {pick} (nearest selected at {spread:.6})");
        model.extend(members);
    }

    log::info!(
        "Kennard-Stone selected {} of {n} observations ({:?} metric)",
        model.len(),
        options.metric
    );
    Ok(SelectionResult::from_model(n, model, projection))
}

pub(crate) fn check_seeds(seeds: &[usize], n: usize) -> Result<(), SelectionError> {
    if seeds.is_empty() {
        return Err(SelectionError::invalid("init must contain at least one index"));
    }
    for (pos, &seed) in seeds.iter().enumerate() {
        if seed >= n {
            return Err(SelectionError::invalid(format!(
                "init index {seed} is out of range for {n} observations"
            )));
        }
        if seeds[..pos].contains(&seed) {
            return Err(SelectionError::invalid(format!(
                "init index {seed} appears more than once"
            )));
        }
    }
    Ok(())
}
