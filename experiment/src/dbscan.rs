//! DBSCAN over a dataset's cached distance matrix
//!
//! Density clustering baseline the k-based runs are compared against. The
//! neighbourhood query is a scan of one matrix row, so the matrix built up
//! front by the driver is shared by every `(epsilon, min_pts)` pair.

use anyhow::ensure;
use kbrain::{ClusterData, DistanceMatrix};

// Never reached yet / visited but not density-reachable (may be promoted)
const UNCLASSIFIED: i32 = -2;
const NOISE: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dbscan {
    pub epsilon: f64,
    /// Core-point threshold, the point itself included
    pub min_pts: usize,
}

impl Dbscan {
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Label every point with its cluster id, `None` for noise.
    ///
    /// Cluster ids follow discovery order while scanning point indices
    /// ascending.
    pub fn fit<D>(&self, data: &D) -> anyhow::Result<Vec<Option<usize>>>
    where
        D: ClusterData + ?Sized,
    {
        ensure!(self.epsilon > 0.0, "DBSCAN epsilon must be positive, got {}", self.epsilon);
        ensure!(self.min_pts >= 1, "DBSCAN min_pts must be at least 1");

        let n = data.len();
        let matrix = data.distance_matrix()?;
        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;

        for point in 0..n {
            if visited[point] {
                continue;
            }
            visited[point] = true;

            let neighbors = self.region_query(matrix, n, point);
            if neighbors.len() + 1 < self.min_pts {
                labels[point] = NOISE;
                continue;
            }
            self.expand_cluster(matrix, n, point, neighbors, &mut labels, &mut visited, cluster_id);
            cluster_id += 1;
        }

        Ok(labels.into_iter()
            .map(|label| if label >= 0 { Some(label as usize) } else { None })
            .collect())
    }

    fn region_query(&self, matrix: &DistanceMatrix, n: usize, point: usize) -> Vec<usize> {
        matrix.row(point)[..n].iter().enumerate()
            .filter(|(idx, distance)| *idx != point && **distance <= self.epsilon)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_cluster(
        &self,
        matrix: &DistanceMatrix,
        n: usize,
        point: usize,
        neighbors: Vec<usize>,
        labels: &mut [i32],
        visited: &mut [bool],
        cluster_id: i32,
    ) {
        labels[point] = cluster_id;
        let mut to_process = neighbors;

        while let Some(neighbor) = to_process.pop() {
            // Noise reached from a core point becomes a border point
            if labels[neighbor] == UNCLASSIFIED || labels[neighbor] == NOISE {
                labels[neighbor] = cluster_id;
            }
            if visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;

            let next = self.region_query(matrix, n, neighbor);
            if next.len() + 1 >= self.min_pts {
                // Visited noise is queued too so it gets relabelled on pop
                to_process.extend(next.into_iter().filter(|nn| !visited[*nn] || labels[*nn] == NOISE));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbrain::Dataset;

    fn two_groups_and_outlier() -> Dataset {
        Dataset::new("dbscan", vec![
            vec![0.0, 0.0], vec![0.1, 0.0], vec![0.0, 0.1],
            vec![5.0, 5.0], vec![5.1, 5.0], vec![5.0, 5.1],
            vec![20.0, 20.0],
        ])
    }

    #[test]
    fn finds_groups_and_noise() {
        let labels = Dbscan::new(0.5, 3).fit(&two_groups_and_outlier()).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1), None]);
    }

    #[test]
    fn border_point_is_promoted() {
        // 0 is scanned first and is not core; 1 is core and reaches it
        let data = Dataset::new("border", vec![vec![0.0], vec![1.0], vec![1.5], vec![2.0]]);
        let labels = Dbscan::new(1.0, 4).fit(&data).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn noise_reached_by_later_core_is_promoted() {
        // 0 is marked noise by the outer scan; x=1 is only discovered later
        // through the chain x=3 -> x=2 -> x=1 and must still claim it
        let data = Dataset::new("chain", vec![vec![0.0], vec![3.0], vec![2.0], vec![1.0], vec![3.5]]);
        let labels = Dbscan::new(1.0, 3).fit(&data).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn min_pts_one_makes_every_point_a_cluster() {
        let data = Dataset::new("single", vec![vec![0.0], vec![10.0], vec![20.0]]);
        let labels = Dbscan::new(1.0, 1).fit(&data).unwrap();
        assert_eq!(labels, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn prefix_ignores_points_past_the_view() {
        let data = two_groups_and_outlier();
        data.distance_matrix().unwrap();
        let labels = Dbscan::new(0.5, 3).fit(&data.prefix(4)).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn rejects_bad_parameters() {
        let data = two_groups_and_outlier();
        assert!(Dbscan::new(0.0, 3).fit(&data).is_err());
        assert!(Dbscan::new(0.5, 0).fit(&data).is_err());
    }
}
