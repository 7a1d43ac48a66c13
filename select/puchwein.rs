//! Puchwein selection.
//!
//! Observations are visited in order of decreasing leverage. Each visited
//! observation is kept and everything within the limiting distance of it is
//! discarded. Repeating this with a growing limit gives a family of ever
//! sparser candidate sets; the leverage trace helps decide which pass to use.

use crate::distance::{DistanceMatrix, euclidean};
use crate::error::SelectionError;
use crate::matrix::check_sample_matrix;
use crate::projection::{ComponentSpec, PcaOptions, Projection};
use crate::result::SelectionResult;
use itertools::Itertools;
use ndarray::{Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuchweinOptions {
    /// Initial limiting distance factor, in (0, 1].
    pub k: f64,
    pub components: ComponentSpec,
    /// Passes stop after the first pass that keeps this many observations
    /// or fewer.
    pub min_selected: usize,
    pub pca: PcaOptions,
}

impl Default for PuchweinOptions {
    fn default() -> Self {
        Self {
            k: 0.2,
            components: ComponentSpec::Fraction(0.95),
            min_selected: 5,
            pca: PcaOptions::default(),
        }
    }
}

/// One pass over the leverage-ordered pool at a fixed limiting distance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PuchweinPass {
    /// 1-based pass number; the limiting distance is `pass * d_ini`.
    pub pass: usize,
    pub limiting_distance: f64,
    /// Kept observations in visiting order.
    pub selected: Vec<usize>,
    pub removed: usize,
    pub observed_leverage: f64,
    pub theoretical_leverage: f64,
    /// `observed_leverage - theoretical_leverage`.
    pub leverage_difference: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PuchweinResult {
    pub passes: Vec<PuchweinPass>,
    /// Mahalanobis distance of every observation to the centroid.
    pub leverage: Vec<f64>,
    pub pc: Projection,
}

impl PuchweinResult {
    /// Calibration/test split for the pass at position `index` of
    /// [`PuchweinResult::passes`]. Choosing the pass is up to the caller.
    pub fn selection(&self, index: usize) -> Result<SelectionResult, SelectionError> {
        let pass = self.passes.get(index).ok_or_else(|| {
            SelectionError::invalid(format!(
                "pass {index} requested but only {} passes were run",
                self.passes.len()
            ))
        })?;
        Ok(SelectionResult::from_model(
            self.leverage.len(),
            pass.selected.clone(),
            Some(self.pc.clone()),
        ))
    }

    pub fn selected_counts(&self) -> Vec<usize> {
        self.passes.iter().map(|p| p.selected.len()).collect()
    }
}

pub fn puchwein(
    x: ArrayView2<f64>,
    options: &PuchweinOptions,
) -> Result<PuchweinResult, SelectionError> {
    check_sample_matrix(x, 2)?;
    if !(options.k > 0.0 && options.k <= 1.0) {
        return Err(SelectionError::invalid(format!(
            "the limiting distance factor k must lie in (0, 1], got {}",
            options.k
        )));
    }
    let n = x.nrows();

    let projection = Projection::fit(x, &options.pca, Some(options.components))?;
    let white = projection.whitened()?;
    // Centered scores already have their centroid at the origin.
    let centroid = if options.pca.center {
        Array1::zeros(white.ncols())
    } else {
        white.mean_axis(Axis(0)).ok_or_else(|| {
            SelectionError::invalid("cannot compute the centroid of an empty matrix")
        })?
    };
    let leverage: Vec<f64> = white
        .axis_iter(Axis(0))
        .map(|row| euclidean(row, centroid.view()))
        .collect();

    let order: Vec<usize> = (0..n)
        .sorted_by(|&a, &b| leverage[b].total_cmp(&leverage[a]).then(a.cmp(&b)))
        .collect();

    let distances = DistanceMatrix::new(white.view());
    let components = projection.n_components();
    let initial_limit = options.k * (components.saturating_sub(2).max(1)) as f64;
    let total_leverage: f64 = leverage.iter().sum();
    log::info!(
        "Puchwein on {n} observations in {components} components, initial limiting distance {initial_limit:.4}"
    );

    let mut passes = Vec::new();
    for pass in 1usize.. {
        let limit = pass as f64 * initial_limit;
        let selected = thin_out(&order, &distances, limit);
        let kept = selected.len();
        let observed: f64 = selected.iter().map(|&idx| leverage[idx]).sum();
        let theoretical = total_leverage * kept as f64 / n as f64;
        log::debug!("Puchwein pass {pass}: limit {limit:.4}, kept {kept}, removed {}", n - kept);
        passes.push(PuchweinPass {
            pass,
            limiting_distance: limit,
            selected,
            removed: n - kept,
            observed_leverage: observed,
            theoretical_leverage: theoretical,
            leverage_difference: observed - theoretical,
        });
        if kept <= options.min_selected || kept <= 1 {
            break;
        }
    }

    Ok(PuchweinResult {
        passes,
        leverage,
        pc: projection,
    })
}

/// Keeps the head of the pool and drops everything within `limit` of it,
/// until the pool is exhausted.
fn thin_out(order: &[usize], distances: &DistanceMatrix, limit: f64) -> Vec<usize> {
    let mut pool = order.to_vec();
    let mut selected = Vec::new();
    while let Some(&head) = pool.first() {
        selected.push(head);
        pool.retain(|&other| other != head && distances.get(head, other) > limit);
    }
    selected
}
