use crate::error::SelectionError;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// A sample matrix carrying optional row and column labels.
///
/// Labels ride along with the numbers so that projections derived from the
/// matrix can still be traced back to sample names; the selection algorithms
/// themselves only ever see [`LabeledMatrix::view`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabeledMatrix {
    values: Array2<f64>,
    row_names: Option<Vec<String>>,
    col_names: Option<Vec<String>>,
}

impl LabeledMatrix {
    pub fn new(values: Array2<f64>) -> Self {
        Self {
            values,
            row_names: None,
            col_names: None,
        }
    }

    pub fn with_row_names(mut self, names: Vec<String>) -> Result<Self, SelectionError> {
        if names.len() != self.values.nrows() {
            return Err(SelectionError::invalid(format!(
                "{} row names supplied for a matrix with {} rows",
                names.len(),
                self.values.nrows()
            )));
        }
        self.row_names = Some(names);
        Ok(self)
    }

    pub fn with_col_names(mut self, names: Vec<String>) -> Result<Self, SelectionError> {
        if names.len() != self.values.ncols() {
            return Err(SelectionError::invalid(format!(
                "{} column names supplied for a matrix with {} columns",
                names.len(),
                self.values.ncols()
            )));
        }
        self.col_names = Some(names);
        Ok(self)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row_names(&self) -> Option<&[String]> {
        self.row_names.as_deref()
    }

    pub fn col_names(&self) -> Option<&[String]> {
        self.col_names.as_deref()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// Rejects empty matrices and non-finite entries.
pub(crate) fn check_sample_matrix(x: ArrayView2<f64>, min_rows: usize) -> Result<(), SelectionError> {
    if x.nrows() < min_rows {
        return Err(SelectionError::invalid(format!(
            "at least {min_rows} observations are required, got {}",
            x.nrows()
        )));
    }
    if x.ncols() == 0 {
        return Err(SelectionError::invalid("the sample matrix has no columns"));
    }
    if let Some(((row, col), value)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(SelectionError::invalid(format!(
            "non-finite value {value} at row {row}, column {col}"
        )));
    }
    Ok(())
}

/// Indices of `0..n` not present in `taken`, ascending.
pub(crate) fn complement(n: usize, taken: &[usize]) -> Vec<usize> {
    let mut mask = vec![false; n];
    for &idx in taken {
        mask[idx] = true;
    }
    mask.iter()
        .enumerate()
        .filter_map(|(idx, &used)| (!used).then_some(idx))
        .collect()
}
