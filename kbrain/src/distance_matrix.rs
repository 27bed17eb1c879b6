//! Pairwise distance precomputation
//! The full symmetric Euclidean matrix of a dataset, built once and shared
//! read-only by every medoid run (and by DBSCAN in the experiment driver).

use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::{dataset::ClusterData, error::{KbrainError, Result}, types::EuclideanDistance};

/// `n x n` symmetric matrix stored flat, row-major.
/// `M[i][i] = 0`, `M[i][j] = M[j][i]` = distance between points `i` and `j`.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Calculate the distance matrix for every point of `data`
    ///
    /// Each unordered pair is computed exactly once: row `i` (in parallel over
    /// rows) evaluates the pairs `j > i`, then the values are mirrored into
    /// both halves. The diagonal stays zero.
    ///
    /// # Errors
    /// `DimensionMismatch` if two points differ in dimensionality.
    pub fn build<D>(data: &D) -> Result<Self>
    where
        D: ClusterData + ?Sized,
    {
        let n = data.len();
        let timer = Instant::now();

        let upper: Vec<Vec<f64>> = (0..n).into_par_iter()
            .map(|i| {
                let left = data.point(i);
                ((i + 1)..n)
                    .map(|j| left.euclidean_distance(data.point(j)))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, distance) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                values[i * n + j] = distance;
                values[j * n + i] = distance;
            }
        }

        debug!(points = n, elapsed = ?timer.elapsed(), "distance matrix built");
        Ok(Self { n, values })
    }

    /// Number of points covered
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Fails unless every index in `0..points` is covered
    pub fn check_covers(&self, points: usize) -> Result<()> {
        if self.n < points {
            return Err(KbrainError::DimensionMismatch { expected: points, found: self.n });
        }
        Ok(())
    }
}

/// Precompute the distance matrix of a dataset.
///
/// This does not cache; use [`ClusterData::distance_matrix`] on a
/// [`crate::Dataset`] to get the memoized matrix.
pub fn build_distance_matrix<D>(data: &D) -> Result<DistanceMatrix>
where
    D: ClusterData + ?Sized,
{
    DistanceMatrix::build(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    #[test]
    fn three_point_matrix() {
        let data = Dataset::new("t", vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![0.0, 0.0]]);
        let m = build_distance_matrix(&data).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(0, 1), 5.0);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.get(1, 2), 5.0);
        assert_eq!(m.row(1), &[5.0, 0.0, 5.0]);
    }

    #[test]
    fn symmetric_with_zero_diagonal() {
        let points = (0..12)
            .map(|i| vec![(i as f64).sin() * 3.0, (i as f64 * 0.7).cos(), i as f64 / 4.0])
            .collect();
        let m = build_distance_matrix(&Dataset::new("s", points)).unwrap();
        for i in 0..m.len() {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..m.len() {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!(m.get(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn mismatched_points_fail() {
        let data = Dataset::new("bad", vec![vec![0.0, 0.0], vec![1.0]]);
        assert_eq!(
            build_distance_matrix(&data),
            Err(KbrainError::DimensionMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn empty_dataset_gives_empty_matrix() {
        let m = build_distance_matrix(&Dataset::new("e", vec![])).unwrap();
        assert!(m.is_empty());
        assert!(m.check_covers(0).is_ok());
        assert!(m.check_covers(1).is_err());
    }
}
