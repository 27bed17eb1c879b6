//! Type definitions and trait implementations for k-means / k-medoids clustering
//! Includes the Euclidean metric, centroid arithmetic, the algorithm selector
//! and the center/result types shared by every stage of a run.

use std::{fmt, str::FromStr};

use num_traits::Float;

use crate::error::{KbrainError, Result};

/// Labels indexed by point index, one per point, each in `0..k`.
pub type ClusterAssignment = Vec<usize>;

/// Exactly `k` centers, indexed by cluster label.
pub type CenterSet = Vec<Center>;

/// Center recomputation strategy, resolved once per run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Centroid = per-dimension arithmetic mean of the cluster ("k-means")
    Mean,
    /// Medoid = member minimizing total intra-cluster distance ("k-medoids")
    Medoid,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Mean => "k-means",
            Algorithm::Medoid => "k-medoids",
        }
    }
}

impl FromStr for Algorithm {
    type Err = KbrainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "k-means" => Ok(Algorithm::Mean),
            "k-medoids" => Ok(Algorithm::Medoid),
            other => Err(KbrainError::InvalidAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the initial centers are drawn from the dataset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Initialization {
    /// k distinct indices drawn uniformly without replacement
    #[default]
    Random,
    /// k-means++ seeding: next index drawn proportionally to squared distance
    /// from the nearest seed already chosen
    PlusPlus,
}

/// A cluster center.
///
/// Mean centers are synthetic points; medoid centers are dataset points and
/// carry the index they were copied from, so two medoids compare equal only
/// when they are the same dataset point.
#[derive(Clone, Debug, PartialEq)]
pub enum Center {
    Centroid(Vec<f64>),
    Medoid { index: usize, point: Vec<f64> },
}

impl Center {
    pub fn point(&self) -> &[f64] {
        match self {
            Center::Centroid(point) => point,
            Center::Medoid { point, .. } => point,
        }
    }

    /// Dataset index of a medoid, `None` for centroids
    pub fn medoid(&self) -> Option<usize> {
        match self {
            Center::Centroid(_) => None,
            Center::Medoid { index, .. } => Some(*index),
        }
    }
}

/// Final state of a converged run
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub assignment: ClusterAssignment,
    pub centers: CenterSet,
    /// Assign/update rounds performed, 0 for the `k == 1` and `k == n` shortcuts
    pub iterations: usize,
    /// Objective of the final assignment: sum of squared distances for
    /// `Mean`, sum of distances for `Medoid`
    pub cost: f64,
}

/// Events reported to the run observer
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// Emitted after every assignment phase
    Iteration { iteration: usize, cost: f64 },
    /// A cluster got no points and kept its previous center
    EmptyCluster { iteration: usize, cluster: usize },
}

/// Output of one center update: the new centers plus every cluster that kept
/// its previous center because nothing was assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct CenterUpdate {
    pub centers: CenterSet,
    pub empty: Vec<usize>,
}

/// Operations required for centroid calculations
pub trait KmeansValue {
    /// Zero vector of the given dimension
    fn zero(dim: usize) -> Self;
    /// Element-wise accumulation of `right` into `self`
    fn sum_by_field(&mut self, right: &[f64]) -> Result<()>;
    /// Divide all elements by a count (for averaging)
    fn div_by_n(&self, div: usize) -> Self;
}

impl KmeansValue for Vec<f64> {
    fn zero(dim: usize) -> Self {
        vec![0.0; dim]
    }
    fn sum_by_field(&mut self, right: &[f64]) -> Result<()> {
        if self.len() != right.len() {
            return Err(KbrainError::DimensionMismatch { expected: self.len(), found: right.len() });
        }
        self.iter_mut().zip(right.iter()).for_each(|(a, b)| *a += *b);
        Ok(())
    }
    fn div_by_n(&self, div: usize) -> Self {
        self.iter().map(|a| *a / div as f64).collect()
    }
}

/// Euclidean metric over points of equal dimension
pub trait EuclideanDistance {
    type Value;
    /// `sum((a[i] - b[i])^2)`
    fn squared_distance(&self, right: &Self) -> Result<Self::Value>;
    /// `sqrt(sum((a[i] - b[i])^2))`
    fn euclidean_distance(&self, right: &Self) -> Result<Self::Value>;
}

impl<D> EuclideanDistance for [D]
where
    D: Float,
{
    type Value = D;

    fn squared_distance(&self, right: &Self) -> Result<D> {
        if self.len() != right.len() {
            return Err(KbrainError::DimensionMismatch { expected: self.len(), found: right.len() });
        }
        Ok(self.iter().zip(right.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .fold(D::zero(), |acc, x| acc + x))
    }

    fn euclidean_distance(&self, right: &Self) -> Result<D> {
        self.squared_distance(right).map(|d| d.sqrt())
    }
}
