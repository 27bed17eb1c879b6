//! The assign/update iteration loop.
//!
//! A run moves through `Initializing -> Assigning -> Updating` and repeats
//! `Assigning -> Updating` until recomputing the centers gives back exactly
//! the centers it started from (`Converged`). The update strategy is picked
//! once per run; the distance matrix is borrowed from the dataset for the
//! whole run and never rebuilt mid-run.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    dataset::ClusterData,
    distance_matrix::DistanceMatrix,
    error::{KbrainError, Result},
    euclidean_centers::mean_centers,
    medoid_centers::medoid_centers,
    types::{Algorithm, Center, CenterSet, CenterUpdate, ClusterAssignment, Diagnostic, EuclideanDistance, Initialization, RunResult},
};

/// Iteration cap applied when none is given
pub const DEFAULT_MAX_ITERATION: usize = 300;

/// Clustering model: number of clusters, strategy and a seeded random source.
///
/// The generator advances with every fit, so refitting the same model gives
/// a new draw of initial centers; build a fresh model with the same seed to
/// reproduce a run.
#[derive(Clone, Debug)]
pub struct KBrain {
    pub k: usize,
    pub algorithm: Algorithm,
    pub init: Initialization,
    /// `None` iterates until convergence with no cap
    pub max_iteration: Option<usize>,
    pub rng: ChaCha20Rng,
}

impl KBrain {
    pub fn new(
        k: usize,
        algorithm: Algorithm,
        init: Option<Initialization>,
        seed: u64,
        max_iteration: Option<usize>,
    ) -> Self {
        Self {
            k,
            algorithm,
            init: init.unwrap_or_default(),
            max_iteration: Some(max_iteration.unwrap_or(DEFAULT_MAX_ITERATION)),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Drop the iteration cap
    pub fn unbounded(mut self) -> Self {
        self.max_iteration = None;
        self
    }

    /// Fit the model, logging diagnostics through `tracing`
    pub fn fit<D>(&mut self, data: &D) -> Result<RunResult>
    where
        D: ClusterData + ?Sized,
    {
        let algorithm = self.algorithm;
        let k = self.k;
        self.fit_with(data, |event| match event {
            Diagnostic::Iteration { iteration, cost } => {
                debug!(%algorithm, k, iteration, cost, "iteration finished");
            }
            Diagnostic::EmptyCluster { iteration, cluster } => {
                warn!(%algorithm, k, iteration, cluster, "empty cluster, keeping previous center");
            }
        })
    }

    /// Fit the model, reporting every [`Diagnostic`] to `observer`
    ///
    /// # Errors
    /// * `InvalidK` if `k == 0` or `k > data.len()`
    /// * `DimensionMismatch` for ragged points or a matrix that does not
    ///   cover the dataset
    /// * `NonConvergence` if the iteration cap is reached
    pub fn fit_with<D, F>(&mut self, data: &D, mut observer: F) -> Result<RunResult>
    where
        D: ClusterData + ?Sized,
        F: FnMut(Diagnostic),
    {
        let n = data.len();
        let k = self.k;
        if k == 0 || k > n {
            return Err(KbrainError::InvalidK { k, n });
        }

        let strategy = Strategy::resolve(self.algorithm, data)?;

        if k == 1 {
            let assignment = vec![0; n];
            let CenterUpdate { centers, .. } = strategy.recalculate(data, &assignment, &[strategy.seed_center(data, 0)])?;
            let cost = strategy.objective(data, &assignment, &centers)?;
            info!(algorithm = %self.algorithm, k, n, "single cluster, no iteration");
            return Ok(RunResult { assignment, centers, iterations: 0, cost });
        }

        if k == n {
            let assignment: ClusterAssignment = (0..n).collect();
            let centers: CenterSet = (0..n).map(|i| strategy.seed_center(data, i)).collect();
            info!(algorithm = %self.algorithm, k, n, "one cluster per point, no iteration");
            return Ok(RunResult { assignment, centers, iterations: 0, cost: 0.0 });
        }

        // Initializing
        let mut centers: CenterSet = self.init.select(k, data, &mut self.rng)?
            .into_iter()
            .map(|i| strategy.seed_center(data, i))
            .collect();
        let mut assignment: ClusterAssignment = vec![0; n];
        let mut iteration = 0;

        loop {
            if self.max_iteration.is_some_and(|max| iteration >= max) {
                return Err(KbrainError::NonConvergence { iterations: iteration });
            }
            iteration += 1;

            // Assigning
            let cost = strategy.assign_points(data, &centers, &mut assignment)?;
            observer(Diagnostic::Iteration { iteration, cost });

            // Updating
            let update = strategy.recalculate(data, &assignment, &centers)?;
            for cluster in update.empty.iter() {
                observer(Diagnostic::EmptyCluster { iteration, cluster: *cluster });
            }

            if update.centers == centers {
                info!(algorithm = %self.algorithm, k, n, iterations = iteration, cost, "converged");
                return Ok(RunResult { assignment, centers, iterations: iteration, cost });
            }
            centers = update.centers;
        }
    }
}

/// Update strategy resolved once per run; the medoid variant holds the
/// borrowed distance matrix.
#[derive(Clone, Copy, Debug)]
enum Strategy<'a> {
    Mean,
    Medoid(&'a DistanceMatrix),
}

impl<'a> Strategy<'a> {
    fn resolve<D>(algorithm: Algorithm, data: &'a D) -> Result<Self>
    where
        D: ClusterData + ?Sized,
    {
        match algorithm {
            Algorithm::Mean => Ok(Strategy::Mean),
            Algorithm::Medoid => {
                let matrix = data.distance_matrix()?;
                matrix.check_covers(data.len())?;
                Ok(Strategy::Medoid(matrix))
            }
        }
    }

    /// Center copied from dataset point `i`
    fn seed_center<D>(&self, data: &D, i: usize) -> Center
    where
        D: ClusterData + ?Sized,
    {
        match self {
            Strategy::Mean => Center::Centroid(data.point(i).to_vec()),
            Strategy::Medoid(_) => Center::Medoid { index: i, point: data.point(i).to_vec() },
        }
    }

    /// Distance from point `i` to `center`: a matrix lookup for medoids,
    /// the Euclidean metric otherwise
    fn distance<D>(&self, data: &D, i: usize, center: &Center) -> Result<f64>
    where
        D: ClusterData + ?Sized,
    {
        match (self, center) {
            (Strategy::Medoid(matrix), Center::Medoid { index, .. }) => Ok(matrix.get(i, *index)),
            _ => data.point(i).euclidean_distance(center.point()),
        }
    }

    /// Contribution of one point to the objective
    fn cost(&self, distance: f64) -> f64 {
        match self {
            Strategy::Mean => distance * distance,
            Strategy::Medoid(_) => distance,
        }
    }

    /// Label of the nearest center and the distance to it.
    /// Centers are scanned in order `0..k`; only a strictly smaller distance
    /// replaces the current label, so the first of equally near centers wins.
    fn nearest<D>(&self, data: &D, i: usize, centers: &[Center]) -> Result<(usize, f64)>
    where
        D: ClusterData + ?Sized,
    {
        let mut best = (0, f64::INFINITY);
        for (label, center) in centers.iter().enumerate() {
            let distance = self.distance(data, i, center)?;
            if distance < best.1 {
                best = (label, distance);
            }
        }
        Ok(best)
    }

    /// Assign every point to its nearest center, in place, in parallel.
    /// Returns the objective of the new assignment.
    fn assign_points<D>(&self, data: &D, centers: &[Center], assigned: &mut [usize]) -> Result<f64>
    where
        D: ClusterData + ?Sized,
    {
        let costs = assigned.par_iter_mut().enumerate()
            .map(|(i, label)| {
                let (nearest, distance) = self.nearest(data, i, centers)?;
                *label = nearest;
                Ok(self.cost(distance))
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(costs.iter().sum())
    }

    fn objective<D>(&self, data: &D, assigned: &[usize], centers: &[Center]) -> Result<f64>
    where
        D: ClusterData + ?Sized,
    {
        assigned.iter().enumerate()
            .map(|(i, cluster)| self.distance(data, i, &centers[*cluster]).map(|d| self.cost(d)))
            .sum()
    }

    fn recalculate<D>(&self, data: &D, assigned: &[usize], previous: &[Center]) -> Result<CenterUpdate>
    where
        D: ClusterData + ?Sized,
    {
        match self {
            Strategy::Mean => mean_centers(data, assigned, previous),
            Strategy::Medoid(matrix) => Ok(medoid_centers(data, matrix, assigned, previous)),
        }
    }
}

/// Cluster `data` into `k` groups with the named algorithm
///
/// `algorithm` is `"k-means"` or `"k-medoids"`; the medoid variant uses
/// (and on first use builds) the dataset's cached distance matrix.
///
/// # Errors
/// `InvalidAlgorithm` for any other selector (checked before anything else),
/// then everything [`KBrain::fit_with`] can return.
pub fn run<D>(k: usize, algorithm: &str, data: &D, seed: u64) -> Result<ClusterAssignment>
where
    D: ClusterData + ?Sized,
{
    let algorithm: Algorithm = algorithm.parse()?;
    KBrain::new(k, algorithm, None, seed, None)
        .fit(data)
        .map(|result| result.assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Dataset, metrics::dispersion};

    fn five_points() -> Dataset {
        Dataset::new("five", vec![
            vec![0.0, 0.0], vec![1.0, 5.0], vec![2.0, -3.0], vec![7.0, 7.0], vec![-4.0, 2.0],
        ])
    }

    /// Ten points packed around (0,0) (indices 0..5) and (10,10) (indices 5..10)
    fn two_blobs() -> Dataset {
        let offsets = [(0.0, 0.0), (0.3, -0.2), (-0.25, 0.1), (0.1, 0.35), (-0.15, -0.3)];
        let mut points: Vec<Vec<f64>> = offsets.iter().map(|(x, y)| vec![*x, *y]).collect();
        points.extend(offsets.iter().map(|(x, y)| vec![10.0 + x, 10.0 + y]));
        Dataset::new("blobs", points)
    }

    /// Deterministic scattered cloud
    fn cloud(n: usize) -> Dataset {
        Dataset::new("cloud", (0..n)
            .map(|i| {
                let t = i as f64;
                vec![(t * 1.7).sin() * 5.0 + (t * 0.31).cos() * 2.0, (t * 2.3).cos() * 4.0 + t / n as f64]
            })
            .collect())
    }

    fn same_grouping(assignment: &[usize]) {
        assert!(assignment[..5].iter().all(|l| *l == assignment[0]));
        assert!(assignment[5..].iter().all(|l| *l == assignment[5]));
        assert_ne!(assignment[0], assignment[5]);
    }

    #[test]
    fn single_cluster_labels_everything_zero() {
        for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
            let result = KBrain::new(1, algorithm, None, 0, None).fit(&five_points()).unwrap();
            assert_eq!(result.assignment, vec![0; 5]);
            assert_eq!(result.iterations, 0);
            assert_eq!(result.centers.len(), 1);
        }
        let result = KBrain::new(1, Algorithm::Mean, None, 0, None).fit(&five_points()).unwrap();
        assert_eq!(result.centers[0], Center::Centroid(vec![1.2, 2.2]));
    }

    #[test]
    fn one_cluster_per_point() {
        for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
            let result = KBrain::new(5, algorithm, None, 0, None).fit(&five_points()).unwrap();
            assert_eq!(result.assignment, vec![0, 1, 2, 3, 4]);
            assert_eq!(result.iterations, 0);
        }
        let result = KBrain::new(5, Algorithm::Medoid, None, 0, None).fit(&five_points()).unwrap();
        assert_eq!(result.centers.iter().map(|c| c.medoid()).collect::<Vec<_>>(), (0..5).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn zero_clusters_is_invalid() {
        let mut model = KBrain::new(0, Algorithm::Mean, None, 0, None);
        assert_eq!(model.fit(&five_points()), Err(KbrainError::InvalidK { k: 0, n: 5 }));
        let mut model = KBrain::new(6, Algorithm::Medoid, None, 0, None);
        assert_eq!(model.fit(&five_points()), Err(KbrainError::InvalidK { k: 6, n: 5 }));
    }

    #[test]
    fn separated_blobs_converge_quickly() {
        let data = two_blobs();
        for seed in 0..20 {
            for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
                let result = KBrain::new(2, algorithm, None, seed, None).fit(&data).unwrap();
                same_grouping(&result.assignment);
                assert!(result.iterations <= 5, "{algorithm} seed {seed}: {} iterations", result.iterations);
            }
        }
    }

    #[test]
    fn blob_centroids_are_blob_means() {
        let data = two_blobs();
        let result = KBrain::new(2, Algorithm::Mean, Some(Initialization::PlusPlus), 9, None).fit(&data).unwrap();
        same_grouping(&result.assignment);
        let low = result.assignment[0];
        let center = result.centers[low].point();
        assert!((center[0] - 0.0).abs() < 1e-12);
        assert!((center[1] - (-0.01)).abs() < 1e-12);
    }

    #[test]
    fn medoids_belong_to_their_cluster() {
        let data = cloud(40);
        for seed in 0..5 {
            let result = KBrain::new(4, Algorithm::Medoid, None, seed, None).fit(&data).unwrap();
            for (cluster, center) in result.centers.iter().enumerate() {
                let index = center.medoid().unwrap();
                assert_eq!(result.assignment[index], cluster);
                assert_eq!(center.point(), data.point(index));
            }
        }
    }

    #[test]
    fn same_seed_same_result() {
        let data = cloud(50);
        for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
            for init in [Initialization::Random, Initialization::PlusPlus] {
                let a = KBrain::new(3, algorithm, Some(init), 42, None).fit(&data).unwrap();
                let b = KBrain::new(3, algorithm, Some(init), 42, None).fit(&data).unwrap();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn mean_dispersion_never_increases() {
        let data = cloud(60);
        for seed in 0..8 {
            let mut costs = Vec::new();
            let result = KBrain::new(4, Algorithm::Mean, None, seed, None)
                .fit_with(&data, |event| {
                    if let Diagnostic::Iteration { cost, .. } = event {
                        costs.push(cost);
                    }
                })
                .unwrap();
            assert_eq!(costs.len(), result.iterations);
            for pair in costs.windows(2) {
                assert!(pair[1] <= pair[0] + 1e-9, "seed {seed}: {costs:?}");
            }
            let wcss = dispersion(&data, &result.assignment, &result.centers).unwrap();
            assert!((wcss - result.cost).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_cluster_is_reported_and_survived() {
        // Any 3 of these 4 points include two copies of the origin; the later
        // of the two duplicate centers never wins a tie and stays empty.
        let data = Dataset::new("dups", vec![vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0], vec![5.0, 5.0]]);
        for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
            for seed in 0..6 {
                let mut empty = Vec::new();
                let result = KBrain::new(3, algorithm, None, seed, None)
                    .fit_with(&data, |event| {
                        if let Diagnostic::EmptyCluster { cluster, .. } = event {
                            empty.push(cluster);
                        }
                    })
                    .unwrap();
                assert!(!empty.is_empty());
                assert!(result.assignment.iter().all(|l| *l < 3));
                assert!(result.centers.iter().all(|c| c.point().iter().all(|x| x.is_finite())));
            }
        }
    }

    #[test]
    fn ties_go_to_the_first_center() {
        let data = Dataset::new("tie", vec![vec![1.0]]);
        let centers = vec![Center::Centroid(vec![0.0]), Center::Centroid(vec![2.0])];
        assert_eq!(Strategy::Mean.nearest(&data, 0, &centers), Ok((0, 1.0)));
        let centers = vec![Center::Centroid(vec![5.0]), Center::Centroid(vec![0.0]), Center::Centroid(vec![2.0])];
        assert_eq!(Strategy::Mean.nearest(&data, 0, &centers), Ok((1, 1.0)));
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let mut model = KBrain::new(2, Algorithm::Mean, None, 1, Some(0));
        assert_eq!(model.fit(&two_blobs()), Err(KbrainError::NonConvergence { iterations: 0 }));

        let result = KBrain::new(2, Algorithm::Mean, None, 1, None).unbounded().fit(&two_blobs());
        assert!(result.is_ok());
    }

    #[test]
    fn ragged_dataset_fails() {
        let data = Dataset::new("ragged", vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0]]);
        for algorithm in [Algorithm::Mean, Algorithm::Medoid] {
            assert!(matches!(
                KBrain::new(2, algorithm, None, 0, None).fit(&data),
                Err(KbrainError::DimensionMismatch { .. })
            ));
        }
    }

    #[test]
    fn run_by_name() {
        let data = two_blobs();
        same_grouping(&run(2, "k-means", &data, 3).unwrap());
        same_grouping(&run(2, "k-medoids", &data, 3).unwrap());
        assert_eq!(run(2, "dbscan", &data, 3), Err(KbrainError::InvalidAlgorithm("dbscan".to_string())));
        assert_eq!(run(0, "k-means", &data, 3), Err(KbrainError::InvalidK { k: 0, n: 10 }));
    }

    #[test]
    fn medoid_run_on_prefix_uses_parent_matrix() {
        let data = two_blobs();
        let view = data.prefix(7);
        let result = KBrain::new(2, Algorithm::Medoid, None, 5, None).fit(&view).unwrap();
        assert_eq!(result.assignment.len(), 7);
        assert!(result.assignment.iter().all(|l| *l < 2));
        assert!(data.has_distance_matrix());
        for center in result.centers.iter() {
            assert!(center.medoid().unwrap() < 7);
        }
    }
}
