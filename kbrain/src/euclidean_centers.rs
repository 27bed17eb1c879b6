//! Euclidean centroid calculation for k-means clustering
//! Recomputes every center as the arithmetic mean of the points assigned to it

use crate::{dataset::ClusterData, error::Result, types::{Center, CenterUpdate, KmeansValue}};

/// Recalculate cluster centroids using the Euclidean mean
///
/// # Arguments
/// * `data` - all points
/// * `assigned` - label of every point, each in `0..previous.len()`
/// * `previous` - current centers; `k` is taken from its length
///
/// # Algorithm
/// 1. Sum the points of each cluster in point-index order
/// 2. Divide by the count of points in each cluster to get the mean
/// 3. A cluster with no points keeps its previous center and is listed
///    in [`CenterUpdate::empty`]
///
/// # Errors
/// `DimensionMismatch` if a point's length differs from `data.dim()`.
pub fn mean_centers<D>(data: &D, assigned: &[usize], previous: &[Center]) -> Result<CenterUpdate>
where
    D: ClusterData + ?Sized,
{
    let k = previous.len();
    let dim = data.dim();

    let mut sums: Vec<Vec<f64>> = (0..k).map(|_| <Vec<f64> as KmeansValue>::zero(dim)).collect();
    let mut counts = vec![0usize; k];

    for (i, cluster) in assigned.iter().enumerate() {
        sums[*cluster].sum_by_field(data.point(i))?;
        counts[*cluster] += 1;
    }

    let mut empty = Vec::new();
    let centers = sums.into_iter().zip(counts).enumerate()
        .map(|(cluster, (sum, count))| {
            if count == 0 {
                empty.push(cluster);
                previous[cluster].clone()
            } else {
                Center::Centroid(sum.div_by_n(count))
            }
        })
        .collect();

    Ok(CenterUpdate { centers, empty })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Dataset, error::KbrainError};

    #[test]
    fn centroid_is_per_dimension_mean() {
        let data = Dataset::new("m", vec![
            vec![0.0, 0.0], vec![2.0, 4.0],
            vec![10.0, 10.0], vec![12.0, 10.0], vec![14.0, 16.0],
        ]);
        let previous = vec![Center::Centroid(vec![0.0, 0.0]), Center::Centroid(vec![9.0, 9.0])];
        let update = mean_centers(&data, &[0, 0, 1, 1, 1], &previous).unwrap();
        assert!(update.empty.is_empty());
        assert_eq!(update.centers, vec![
            Center::Centroid(vec![1.0, 2.0]),
            Center::Centroid(vec![12.0, 12.0]),
        ]);
    }

    #[test]
    fn empty_cluster_keeps_previous_center() {
        let data = Dataset::new("e", vec![vec![1.0], vec![3.0]]);
        let previous = vec![
            Center::Centroid(vec![0.0]),
            Center::Medoid { index: 1, point: vec![3.0] },
            Center::Centroid(vec![42.0]),
        ];
        let update = mean_centers(&data, &[0, 0], &previous).unwrap();
        assert_eq!(update.empty, vec![1, 2]);
        assert_eq!(update.centers[0], Center::Centroid(vec![2.0]));
        assert_eq!(update.centers[1], previous[1]);
        assert_eq!(update.centers[2], previous[2]);
        assert!(update.centers.iter().all(|c| c.point().iter().all(|x| !x.is_nan())));
    }

    #[test]
    fn ragged_point_is_rejected() {
        let data = Dataset::new("r", vec![vec![1.0, 1.0], vec![3.0]]);
        let previous = vec![Center::Centroid(vec![0.0, 0.0])];
        assert_eq!(
            mean_centers(&data, &[0, 0], &previous),
            Err(KbrainError::DimensionMismatch { expected: 2, found: 1 })
        );
    }
}
