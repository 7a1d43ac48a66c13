//! SELECT (Shenk & West).
//!
//! Repeatedly keeps the observation with the most neighbours inside a fixed
//! radius and discards that neighbourhood. Distances are Mahalanobis
//! distances in principal component space divided by the number of
//! components.

use crate::distance::{DistanceMatrix, euclidean};
use crate::error::SelectionError;
use crate::matrix::check_sample_matrix;
use crate::projection::{ComponentSpec, PcaOptions, Projection};
use crate::result::SelectionResult;
use ndarray::{Array1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Normalized leverage above which an observation counts as an outlier.
pub const OUTLIER_LEVERAGE: f64 = 3.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShenkWestOptions {
    /// Neighbourhood radius in normalized Mahalanobis units.
    pub d_min: f64,
    pub components: ComponentSpec,
    /// Selection stops once the remaining fraction of the population falls
    /// below this value. With `remove_outliers`, the population is the set
    /// of observations left after outlier exclusion.
    pub threshold: f64,
    pub remove_outliers: bool,
    pub pca: PcaOptions,
}

impl Default for ShenkWestOptions {
    fn default() -> Self {
        Self {
            d_min: 0.6,
            components: ComponentSpec::Fraction(0.95),
            threshold: 0.6,
            remove_outliers: false,
            pca: PcaOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShenkWestResult {
    pub selection: SelectionResult,
    /// Observations excluded up front as outliers (they are part of `test`).
    pub outliers: Vec<usize>,
}

pub fn shenk_west(
    x: ArrayView2<f64>,
    options: &ShenkWestOptions,
) -> Result<ShenkWestResult, SelectionError> {
    check_sample_matrix(x, 2)?;
    if !(options.d_min > 0.0) {
        return Err(SelectionError::invalid(format!(
            "d_min must be positive, got {}",
            options.d_min
        )));
    }
    if !(0.0..=1.0).contains(&options.threshold) {
        return Err(SelectionError::invalid(format!(
            "threshold must lie in [0, 1], got {}",
            options.threshold
        )));
    }
    let n = x.nrows();

    let projection = Projection::fit(x, &options.pca, Some(options.components))?;
    let components = projection.n_components() as f64;
    let white = projection.whitened()?;

    let mut outliers = Vec::new();
    let mut pool: Vec<usize> = (0..n).collect();
    if options.remove_outliers {
        let centroid = if options.pca.center {
            Array1::zeros(white.ncols())
        } else {
            white.mean_axis(Axis(0)).ok_or_else(|| {
                SelectionError::invalid("cannot compute the centroid of an empty matrix")
            })?
        };
        for (idx, row) in white.axis_iter(Axis(0)).enumerate() {
            if euclidean(row, centroid.view()) / components > OUTLIER_LEVERAGE {
                outliers.push(idx);
            }
        }
        pool.retain(|idx| !outliers.contains(idx));
        log::info!("SELECT excluded {} outliers", outliers.len());
    }

    let eligible = pool.len() as f64;
    let distances = DistanceMatrix::new(white.view());
    let within = |a: usize, b: usize| distances.get(a, b) / components <= options.d_min;

    let mut model = Vec::new();
    while !pool.is_empty() && pool.len() as f64 / eligible >= options.threshold {
        let counts: Vec<usize> = pool
            .par_iter()
            .map(|&candidate| pool.iter().filter(|&&other| within(candidate, other)).count())
            .collect();
        let mut best: Option<(usize, usize)> = None;
        for (&candidate, &count) in pool.iter().zip(&counts) {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((candidate, count));
            }
        }
        let Some((pick, count)) = best else {
            break;
        };
        model.push(pick);
        pool.retain(|&other| other != pick && !within(pick, other));
        log::debug!("SELECT kept {pick} with {count} neighbours, {} remain", pool.len());
    }

    log::info!("SELECT kept {} of {n} observations", model.len());
    Ok(ShenkWestResult {
        selection: SelectionResult::from_model(n, model, Some(projection)),
        outliers,
    })
}
