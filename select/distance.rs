use crate::error::SelectionError;
use crate::projection::{ComponentSpec, PcaOptions, Projection};
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Distance used to compare observations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Euclidean,
    /// Euclidean distance between whitened principal component scores.
    #[default]
    Mahalanobis,
}

#[inline]
pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Distances between every row of `a` and every row of `b` (m x n).
pub fn cross_distances(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
) -> Result<Array2<f64>, SelectionError> {
    if a.ncols() != b.ncols() {
        return Err(SelectionError::invalid(format!(
            "cannot compare rows of {} columns with rows of {} columns",
            a.ncols(),
            b.ncols()
        )));
    }
    let mut out = Array2::zeros((a.nrows(), b.nrows()));
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(a.axis_iter(Axis(0)).into_par_iter())
        .for_each(|(mut out_row, a_row)| {
            for (slot, b_row) in out_row.iter_mut().zip(b.axis_iter(Axis(0))) {
                *slot = euclidean(a_row, b_row);
            }
        });
    Ok(out)
}

/// Distance from `point` to every row of `x`.
pub fn distances_to(x: ArrayView2<f64>, point: ArrayView1<f64>) -> Array1<f64> {
    x.axis_iter(Axis(0))
        .map(|row| euclidean(row, point))
        .collect()
}

/// Coordinates in which a selector measures distances, along with the
/// projection that produced them (if any).
///
/// * Euclidean, no components: the rows as given.
/// * Euclidean with components: principal component scores.
/// * Mahalanobis: whitened principal component scores; all components up to
///   the rank are used when `components` is `None`.
pub fn metric_space(
    x: ArrayView2<f64>,
    metric: Metric,
    components: Option<ComponentSpec>,
    pca: &PcaOptions,
) -> Result<(Array2<f64>, Option<Projection>), SelectionError> {
    match (metric, components) {
        (Metric::Euclidean, None) => Ok((x.to_owned(), None)),
        (Metric::Euclidean, Some(spec)) => {
            let projection = Projection::fit(x, pca, Some(spec))?;
            Ok((projection.scores().clone(), Some(projection)))
        }
        (Metric::Mahalanobis, spec) => {
            let projection = Projection::fit(x, pca, spec)?;
            let white = projection.whitened()?;
            Ok((white, Some(projection)))
        }
    }
}

/// Symmetric matrix of pairwise distances between the rows of one matrix.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    values: Array2<f64>,
}

impl DistanceMatrix {
    pub fn new(coords: ArrayView2<f64>) -> Self {
        let n = coords.nrows();
        let mut values = Array2::zeros((n, n));
        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut row)| {
                let own = coords.row(i);
                for (j, slot) in row.iter_mut().enumerate() {
                    if i != j {
                        *slot = euclidean(own, coords.row(j));
                    }
                }
            });
        Self { values }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// The most distant pair `(i, j)` with `i < j`. Ties go to the pair that
    /// comes first in row-major order.
    pub fn farthest_pair(&self) -> Option<(usize, usize)> {
        let n = self.len();
        let mut best: Option<((usize, usize), f64)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.values[(i, j)];
                if best.is_none_or(|(_, top)| d > top) {
                    best = Some(((i, j), d));
                }
            }
        }
        best.map(|(pair, _)| pair)
    }
}

/// Running distance from each unselected observation to its nearest selected
/// one.
///
/// The pool is kept in ascending index order so that the first maximum found
/// is the lowest index.
#[derive(Clone, Debug)]
pub struct NearestSelected {
    pool: Vec<usize>,
    minima: Vec<f64>,
}

impl NearestSelected {
    /// Starts tracking `pool` against an initial `selected` set, reading the
    /// pool x selected slice of `distances` once.
    pub fn new(mut pool: Vec<usize>, selected: &[usize], distances: &DistanceMatrix) -> Self {
        pool.sort_unstable();
        let minima = pool
            .iter()
            .map(|&candidate| {
                selected
                    .iter()
                    .map(|&chosen| distances.get(candidate, chosen))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        Self { pool, minima }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn pool(&self) -> &[usize] {
        &self.pool
    }

    /// Current nearest-selected distance of a pool member.
    pub fn minimum_of(&self, index: usize) -> Option<f64> {
        self.pool
            .binary_search(&index)
            .ok()
            .map(|pos| self.minima[pos])
    }

    /// Pool member farthest from its nearest selected neighbour.
    pub fn farthest(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (&candidate, &distance) in self.pool.iter().zip(&self.minima) {
            if best.is_none_or(|(_, top)| distance > top) {
                best = Some((candidate, distance));
            }
        }
        best
    }

    /// Drops `indices` from the pool; indices not in the pool are ignored.
    pub fn remove(&mut self, indices: &[usize]) {
        let mut kept_pool = Vec::with_capacity(self.pool.len());
        let mut kept_minima = Vec::with_capacity(self.minima.len());
        for (&candidate, &distance) in self.pool.iter().zip(&self.minima) {
            if !indices.contains(&candidate) {
                kept_pool.push(candidate);
                kept_minima.push(distance);
            }
        }
        self.pool = kept_pool;
        self.minima = kept_minima;
    }

    /// Folds a newly selected observation into every running minimum.
    pub fn absorb(&mut self, added: usize, distances: &DistanceMatrix) {
        let row = distances.row(added);
        for (&candidate, minimum) in self.pool.iter().zip(self.minima.iter_mut()) {
            let d = row[candidate];
            if d < *minimum {
                *minimum = d;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn cube() -> Array2<f64> {
        // Vertices of a cube: orthogonal, zero-mean columns with variance 8/7.
        let scale = (7.0_f64 / 8.0).sqrt();
        let mut rows = Vec::new();
        for a in [-1.0, 1.0] {
            for b in [-1.0, 1.0] {
                for c in [-1.0, 1.0] {
                    rows.extend([a * scale, b * scale, c * scale]);
                }
            }
        }
        Array2::from_shape_vec((8, 3), rows).unwrap()
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let x = array![[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]];
        let dm = DistanceMatrix::new(x.view());
        assert_abs_diff_eq!(dm.get(0, 1), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dm.get(0, 2), 10.0, epsilon = 1e-12);
        for i in 0..3 {
            assert_eq!(dm.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(dm.get(i, j), dm.get(j, i));
            }
        }
        assert_eq!(dm.farthest_pair(), Some((0, 2)));
    }

    #[test]
    fn cross_distances_match_full_matrix() {
        let x = cube();
        let dm = DistanceMatrix::new(x.view());
        let rect = cross_distances(x.slice(ndarray::s![..3, ..]), x.view()).unwrap();
        assert_eq!(rect.dim(), (3, 8));
        for i in 0..3 {
            for j in 0..8 {
                assert_abs_diff_eq!(rect[(i, j)], dm.get(i, j), epsilon = 1e-12);
            }
        }
        let single = distances_to(x.view(), x.row(5));
        assert_abs_diff_eq!(single[2], dm.get(5, 2), epsilon = 1e-12);
    }

    #[test]
    fn cross_distances_require_equal_widths() {
        let a = array![[0.0, 1.0]];
        let b = array![[0.0, 1.0, 2.0]];
        assert!(cross_distances(a.view(), b.view()).is_err());
    }

    #[test]
    fn mahalanobis_equals_euclidean_under_identity_whitening() {
        let x = cube();
        let (euclid, none) =
            metric_space(x.view(), Metric::Euclidean, None, &PcaOptions::default()).unwrap();
        assert!(none.is_none());
        let (white, projection) =
            metric_space(x.view(), Metric::Mahalanobis, None, &PcaOptions::default()).unwrap();
        let projection = projection.unwrap();
        for &value in projection.eigenvalues() {
            assert_abs_diff_eq!(value, 1.0, epsilon = 1e-10);
        }
        let a = DistanceMatrix::new(euclid.view());
        let b = DistanceMatrix::new(white.view());
        for i in 0..8 {
            for j in 0..8 {
                assert_abs_diff_eq!(a.get(i, j), b.get(i, j), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn running_minimum_tracks_nearest_selected() {
        let x = array![[0.0, 0.0], [1.0, 0.0], [5.0, 0.0], [9.0, 0.0], [10.0, 0.0]];
        let dm = DistanceMatrix::new(x.view());
        let mut tracker = NearestSelected::new(vec![1, 2, 3], &[0, 4], &dm);
        assert_abs_diff_eq!(tracker.minimum_of(2).unwrap(), 5.0, epsilon = 1e-12);
        assert_eq!(tracker.farthest(), Some((2, 5.0)));

        tracker.remove(&[2]);
        tracker.absorb(2, &dm);
        assert_abs_diff_eq!(tracker.minimum_of(1).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tracker.minimum_of(3).unwrap(), 1.0, epsilon = 1e-12);
        // Tie between 1 and 3 goes to the lower index.
        assert_eq!(tracker.farthest().map(|(idx, _)| idx), Some(1));
        assert_eq!(tracker.minimum_of(2), None);
    }
}
