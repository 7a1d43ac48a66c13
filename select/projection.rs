use crate::error::SelectionError;
use crate::matrix::{LabeledMatrix, check_sample_matrix};
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use ndarray_linalg::{Eigh, UPLO};
use serde::{Deserialize, Serialize};

/// Relative size below which an eigenvalue is treated as zero.
pub const EIGENVALUE_EPSILON: f64 = 1.0e-9;
/// Column scale below which a column counts as constant.
pub const SCALE_FLOOR: f64 = 1.0e-12;

/// Preprocessing applied before the decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaOptions {
    pub center: bool,
    pub scale: bool,
}

impl Default for PcaOptions {
    fn default() -> Self {
        Self {
            center: true,
            scale: false,
        }
    }
}

/// How many principal components to keep.
///
/// In TOML an integer reads as [`ComponentSpec::Count`] and a float as
/// [`ComponentSpec::Fraction`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentSpec {
    /// Keep exactly this many components (clamped to the rank).
    Count(usize),
    /// Keep enough components to explain this fraction of the variance.
    Fraction(f64),
}

impl ComponentSpec {
    pub fn validate(&self) -> Result<(), SelectionError> {
        match *self {
            ComponentSpec::Count(0) => Err(SelectionError::invalid(
                "the number of components must be at least one",
            )),
            ComponentSpec::Fraction(f) if !(f > 0.0 && f < 1.0) => Err(SelectionError::invalid(
                format!("a variance fraction must lie in (0, 1), got {f}"),
            )),
            _ => Ok(()),
        }
    }

    /// Number of components to retain given the per-component explained
    /// variance fractions, in component order.
    pub fn resolve(&self, explained: &[f64]) -> usize {
        let available = explained.len();
        match *self {
            ComponentSpec::Count(count) => {
                if count > available {
                    log::warn!(
                        "Requested {count} components but only {available} are available; keeping {available}"
                    );
                }
                count.min(available)
            }
            ComponentSpec::Fraction(fraction) => components_for_fraction(explained, fraction),
        }
    }
}

/// Leading components whose cumulative fraction stays strictly below
/// `fraction`, plus one. A first component that already reaches the
/// threshold therefore yields exactly one.
pub fn components_for_fraction(explained: &[f64], fraction: f64) -> usize {
    let mut cumulative = 0.0;
    let below = explained
        .iter()
        .take_while(|&&share| {
            cumulative += share;
            cumulative < fraction
        })
        .count();
    (below + 1).min(explained.len())
}

/// Principal component scores of a sample matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projection {
    scores: Array2<f64>,
    eigenvalues: Array1<f64>,
    explained: Array1<f64>,
    row_names: Option<Vec<String>>,
}

impl Projection {
    /// Centers and optionally scales `x`, then decomposes it into principal
    /// components ordered by decreasing variance.
    ///
    /// The covariance matrix is decomposed when there are no more columns
    /// than rows; otherwise the (smaller) Gram matrix is used and the scores
    /// are recovered from its eigenvectors.
    pub fn fit(
        x: ArrayView2<f64>,
        options: &PcaOptions,
        spec: Option<ComponentSpec>,
    ) -> Result<Self, SelectionError> {
        check_sample_matrix(x, 2)?;
        if let Some(spec) = &spec {
            spec.validate()?;
        }

        let (n, p) = x.dim();
        let mut data = x.to_owned();
        if options.center {
            let means = data
                .mean_axis(Axis(0))
                .ok_or_else(|| SelectionError::invalid("cannot center an empty matrix"))?;
            data -= &means;
        }
        if options.scale {
            for (col_idx, mut column) in data.axis_iter_mut(Axis(1)).enumerate() {
                let scale = (column.mapv(|v| v * v).sum() / (n - 1) as f64).sqrt();
                if scale < SCALE_FLOOR {
                    return Err(SelectionError::numerical(format!(
                        "column {col_idx} has zero variance and cannot be scaled"
                    )));
                }
                column /= scale;
            }
        }

        let denom = (n - 1) as f64;
        let total_variance = data.mapv(|v| v * v).sum() / denom;
        if total_variance <= SCALE_FLOOR {
            return Err(SelectionError::numerical(
                "all eigenvalues are numerically zero; the sample matrix has no variance",
            ));
        }

        let max_rank = if options.center {
            (n - 1).min(p)
        } else {
            n.min(p)
        };

        let (eigenvalues, scores) = if p <= n {
            let covariance = data.t().dot(&data) / denom;
            let (values, vectors) = covariance.eigh(UPLO::Lower)?;
            let order = descending_order(&values);
            let values = Array1::from_iter(order.iter().map(|&i| values[i].max(0.0)));
            let rotation = vectors.select(Axis(1), &order);
            (values, data.dot(&rotation))
        } else {
            let gram = data.dot(&data.t());
            let (values, vectors) = gram.eigh(UPLO::Lower)?;
            let order = descending_order(&values);
            let singular = Array1::from_iter(order.iter().map(|&i| values[i].max(0.0).sqrt()));
            let mut scores = vectors.select(Axis(1), &order);
            for (mut column, &sv) in scores.axis_iter_mut(Axis(1)).zip(singular.iter()) {
                column *= sv;
            }
            (singular.mapv(|sv| sv * sv / denom), scores)
        };

        let explained_all: Vec<f64> = eigenvalues
            .iter()
            .take(max_rank)
            .map(|v| v / total_variance)
            .collect();
        let keep = match spec {
            Some(spec) => spec.resolve(&explained_all),
            None => max_rank,
        };

        log::debug!(
            "PCA on {n} x {p} matrix: rank {max_rank}, keeping {keep} components ({:.4} of variance)",
            explained_all[..keep].iter().sum::<f64>()
        );

        Ok(Self {
            scores: scores.slice(s![.., ..keep]).to_owned(),
            eigenvalues: eigenvalues.slice(s![..keep]).to_owned(),
            explained: Array1::from(explained_all[..keep].to_vec()),
            row_names: None,
        })
    }

    /// Same as [`Projection::fit`], carrying the matrix's row names over to
    /// the scores.
    pub fn fit_labeled(
        matrix: &LabeledMatrix,
        options: &PcaOptions,
        spec: Option<ComponentSpec>,
    ) -> Result<Self, SelectionError> {
        let mut projection = Self::fit(matrix.view(), options, spec)?;
        projection.row_names = matrix.row_names().map(<[String]>::to_vec);
        Ok(projection)
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Fraction of the total variance carried by each retained component.
    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained
    }

    pub fn cumulative_variance_ratio(&self) -> Array1<f64> {
        let mut running = 0.0;
        self.explained.mapv(|share| {
            running += share;
            running
        })
    }

    pub fn n_components(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn row_names(&self) -> Option<&[String]> {
        self.row_names.as_deref()
    }

    pub fn component_names(&self) -> Vec<String> {
        (1..=self.n_components()).map(|i| format!("PC{i}")).collect()
    }

    /// Scores divided by the standard deviation of their component. Euclidean
    /// distance between whitened rows is the Mahalanobis distance.
    pub fn whitened(&self) -> Result<Array2<f64>, SelectionError> {
        let largest = self.eigenvalues.first().copied().unwrap_or(0.0);
        let mut white = self.scores.clone();
        for (idx, (mut column, &value)) in white
            .axis_iter_mut(Axis(1))
            .zip(self.eigenvalues.iter())
            .enumerate()
        {
            if value <= 0.0 || value <= EIGENVALUE_EPSILON * largest {
                return Err(SelectionError::numerical(format!(
                    "component {} has a numerically zero eigenvalue ({value:.3e}); \
                     Mahalanobis whitening is impossible, request fewer components",
                    idx + 1
                )));
            }
            column /= value.sqrt();
        }
        Ok(white)
    }
}

fn descending_order(values: &Array1<f64>) -> Vec<usize> {
    (0..values.len())
        .sorted_by(|&a, &b| values[b].total_cmp(&values[a]))
        .collect()
}
