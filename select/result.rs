use crate::matrix::complement;
use crate::projection::Projection;
use serde::{Deserialize, Serialize};

/// Outcome of a calibration/test split.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected rows in the order they were selected.
    pub model: Vec<usize>,
    /// Every other row, ascending.
    pub test: Vec<usize>,
    /// Principal component projection the selection was made in, if any.
    pub pc: Option<Projection>,
}

impl SelectionResult {
    pub(crate) fn from_model(n: usize, model: Vec<usize>, pc: Option<Projection>) -> Self {
        let test = complement(n, &model);
        Self { model, test, pc }
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_order_is_kept_and_test_is_the_rest() {
        let result = SelectionResult::from_model(6, vec![5, 0, 3], None);
        assert_eq!(result.model, vec![5, 0, 3]);
        assert_eq!(result.test, vec![1, 2, 4]);
        assert_eq!(result.len(), 3);
    }
}
