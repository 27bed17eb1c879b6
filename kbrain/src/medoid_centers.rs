//! Medoid search for k-medoids clustering
//! Every cluster's new center is the member with the smallest total distance
//! to the other members, read from the precomputed distance matrix.

use rayon::prelude::*;

use crate::{dataset::ClusterData, distance_matrix::DistanceMatrix, types::{Center, CenterUpdate}};

/// Point indices of every cluster, ascending within each cluster
pub fn cluster_members(assigned: &[usize], k: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); k];
    for (i, cluster) in assigned.iter().enumerate() {
        if let Some(list) = members.get_mut(*cluster) {
            list.push(i);
        }
    }
    members
}

/// Best medoid candidate among `members` and its total distance
///
/// Exhaustive O(s^2) scan. Candidates are evaluated in the order given
/// (ascending point index) and the incumbent is replaced only on strict
/// improvement, so ties resolve to the smallest point index.
/// Returns `None` for an empty member list.
pub fn best_medoid(matrix: &DistanceMatrix, members: &[usize]) -> Option<(usize, f64)> {
    members.iter()
        .map(|&candidate| {
            let row = matrix.row(candidate);
            (candidate, members.iter().map(|&other| row[other]).sum::<f64>())
        })
        .fold(None, |best, (candidate, cost)| match best {
            Some((_, best_cost)) if cost >= best_cost => best,
            _ => Some((candidate, cost)),
        })
}

/// Recalculate cluster medoids
///
/// Clusters are searched in parallel; each search only reads the matrix and
/// its own member list, so the result does not depend on scheduling.
/// A cluster with no members keeps its previous center and is listed in
/// [`CenterUpdate::empty`].
pub fn medoid_centers<D>(
    data: &D,
    matrix: &DistanceMatrix,
    assigned: &[usize],
    previous: &[Center],
) -> CenterUpdate
where
    D: ClusterData + ?Sized,
{
    let members = cluster_members(assigned, previous.len());

    let found: Vec<Option<usize>> = members.par_iter()
        .map(|list| best_medoid(matrix, list).map(|(index, _)| index))
        .collect();

    let mut empty = Vec::new();
    let centers = found.into_iter().enumerate()
        .map(|(cluster, medoid)| match medoid {
            Some(index) => Center::Medoid { index, point: data.point(index).to_vec() },
            None => {
                empty.push(cluster);
                previous[cluster].clone()
            }
        })
        .collect();

    CenterUpdate { centers, empty }
}
