//! Cluster quality measures for finished (or in-flight) assignments

use crate::{dataset::ClusterData, error::Result, types::{Center, EuclideanDistance}};

/// Within-cluster sum of squares: `sum_i ||x_i - c(label_i)||^2`
///
/// Lower is tighter. Lloyd iterations never increase it.
pub fn dispersion<D>(data: &D, assigned: &[usize], centers: &[Center]) -> Result<f64>
where
    D: ClusterData + ?Sized,
{
    assigned.iter().enumerate()
        .map(|(i, cluster)| data.point(i).squared_distance(centers[*cluster].point()))
        .sum()
}

/// Number of points carrying each label `0..k`
pub fn cluster_sizes(assigned: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0; k];
    assigned.iter().filter(|c| **c < k).for_each(|c| sizes[*c] += 1);
    sizes
}
