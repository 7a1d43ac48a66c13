//! Honigs selection on absorption features.
//!
//! At every step the largest absolute value left in the matrix names both a
//! sample and a band. That sample's spectrum is then subtracted, suitably
//! scaled, from every other spectrum so the band reads zero everywhere, and
//! the next step looks for the strongest feature that remains unexplained.

use crate::error::SelectionError;
use crate::matrix::check_sample_matrix;
use crate::result::SelectionResult;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Units of the input spectra.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    #[default]
    Absorbance,
    /// Converted to absorbance as `log10(1 / R)` before selection.
    Reflectance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HonigsOptions {
    pub k: usize,
    #[serde(default)]
    pub signal: SignalType,
}

impl HonigsOptions {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            signal: SignalType::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HonigsResult {
    pub selection: SelectionResult,
    /// Band (column) used at each step, parallel to `selection.model`.
    pub bands: Vec<usize>,
    /// Matrix left after the last deflation.
    pub residual: Array2<f64>,
}

pub fn honigs(x: ArrayView2<f64>, options: &HonigsOptions) -> Result<HonigsResult, SelectionError> {
    check_sample_matrix(x, 1)?;
    let n = x.nrows();
    if options.k == 0 || options.k > n {
        return Err(SelectionError::invalid(format!(
            "k must lie between 1 and the {n} observations, got {}",
            options.k
        )));
    }

    let mut work = match options.signal {
        SignalType::Absorbance => x.to_owned(),
        SignalType::Reflectance => to_absorbance(x)?,
    };

    let mut active = vec![true; n];
    let mut model = Vec::with_capacity(options.k);
    let mut bands = Vec::with_capacity(options.k);

    for step in 0..options.k {
        let Some((row, band, pivot)) = strongest_feature(&work, &active) else {
            break;
        };
        if pivot == 0.0 {
            return Err(SelectionError::numerical(format!(
                "nothing left to explain after {step} selections; the remaining spectra are all zero"
            )));
        }
        let selected = work.row(row).to_owned();
        for (other, mut spectrum) in work.axis_iter_mut(Axis(0)).enumerate() {
            if other == row || !active[other] {
                continue;
            }
            let factor = spectrum[band] / pivot;
            spectrum.scaled_add(-factor, &selected);
            spectrum[band] = 0.0;
        }
        work.row_mut(row).fill(0.0);
        active[row] = false;
        log::debug!("Honigs step {}: sample {row} at band {band} ({pivot:.6})", step + 1);
        model.push(row);
        bands.push(band);
    }

    log::info!("Honigs selected {} of {n} observations", model.len());
    Ok(HonigsResult {
        selection: SelectionResult::from_model(n, model, None),
        bands,
        residual: work,
    })
}

fn to_absorbance(x: ArrayView2<f64>) -> Result<Array2<f64>, SelectionError> {
    if let Some(((row, col), value)) = x.indexed_iter().find(|(_, v)| **v <= 0.0) {
        return Err(SelectionError::numerical(format!(
            "reflectance {value} at row {row}, column {col} has no absorbance equivalent"
        )));
    }
    Ok(x.mapv(|r| (1.0 / r).log10()))
}

/// Active entry with the largest magnitude: `(row, column, signed value)`.
/// Ties resolve to the first entry in row-major order.
fn strongest_feature(work: &Array2<f64>, active: &[bool]) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for ((row, col), &value) in work.indexed_iter() {
        if !active[row] {
            continue;
        }
        if best.is_none_or(|(_, _, top)| value.abs() > top.abs()) {
            best = Some((row, col, value));
        }
    }
    best
}
