//! DUPLEX: two disjoint, equally spread subsets built side by side.

use crate::distance::{DistanceMatrix, Metric, NearestSelected, metric_space};
use crate::error::SelectionError;
use crate::group::{GroupPartition, expand_or_single};
use crate::matrix::{check_sample_matrix, complement};
use crate::projection::{ComponentSpec, PcaOptions, Projection};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DuplexOptions {
    /// Target size of each of the two subsets.
    pub k: usize,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub components: Option<ComponentSpec>,
    #[serde(default)]
    pub pca: PcaOptions,
}

impl DuplexOptions {
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
}

/// The two selected subsets. Unlike [`crate::SelectionResult`], `test` is a
/// selected validation set; rows in neither set are listed in `unassigned`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DuplexResult {
    pub model: Vec<usize>,
    pub test: Vec<usize>,
    pub unassigned: Vec<usize>,
    pub pc: Option<Projection>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Model,
    Test,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Model => Side::Test,
            Side::Test => Side::Model,
        }
    }
}

pub fn duplex(
    x: ArrayView2<f64>,
    options: &DuplexOptions,
    group: Option<&GroupPartition>,
) -> Result<DuplexResult, SelectionError> {
    check_sample_matrix(x, 2)?;
    let n = x.nrows();
    if options.k < 2 {
        return Err(SelectionError::invalid(format!(
            "k must be at least 2, got {}",
            options.k
        )));
    }
    if let Some(partition) = group {
        partition.check_rows(n)?;
    }
    if 2 * options.k > n {
        log::warn!(
            "DUPLEX asked for two sets of {} from {n} observations; sets will be smaller",
            options.k
        );
    }
    let k = options.k;

    let (coords, projection) = metric_space(x, options.metric, options.components, &options.pca)?;
    let distances = DistanceMatrix::new(coords.view());
    let (first, second) = distances
        .farthest_pair()
        .ok_or_else(|| SelectionError::invalid("no pair of observations to compare"))?;

    let mut model = expand_or_single(group, first);
    let mut test: Vec<usize> = expand_or_single(group, second)
        .into_iter()
        .filter(|idx| !model.contains(idx))
        .collect();

    let selected: Vec<usize> = model.iter().chain(test.iter()).copied().collect();
    let mut tracker = NearestSelected::new(complement(n, &selected), &selected, &distances);

    let mut side = Side::Model;
    while model.len() < k || test.len() < k {
        let full = |s: Side| match s {
            Side::Model => model.len() >= k,
            Side::Test => test.len() >= k,
        };
        if full(side) {
            side = side.other();
        }
        let Some((pick, spread)) = tracker.farthest() else {
            break;
        };
        let members = expand_or_single(group, pick);
        tracker.remove(&members);
        for &member in &members {
            tracker.absorb(member, &distances);
        }
        log::trace!("DUPLEX {side:?} takes {pick} (nearest selected at {spread:.6})");
        match side {
            Side::Model => model.extend(members),
            Side::Test => test.extend(members),
        }
        side = side.other();
    }

    let mut taken = model.clone();
    taken.extend_from_slice(&test);
    let unassigned = complement(n, &taken);
    log::info!(
        "DUPLEX selected {} calibration and {} validation observations, {} left over",
        model.len(),
        test.len(),
        unassigned.len()
    );
    Ok(DuplexResult {
        model,
        test,
        unassigned,
        pc: projection,
    })
}
