//! Dataset abstraction consumed by the engine.
//!
//! A dataset is an ordered, immutable table of points. It owns its distance
//! matrix: the matrix is built on the first request and cached for every
//! later medoid run against the same points.

use std::sync::OnceLock;

use crate::{distance_matrix::DistanceMatrix, error::Result};

/// Read-only point table the engine clusters.
pub trait ClusterData: Sync {
    /// Number of points
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Dimensionality (length of the first point, 0 for an empty table)
    fn dim(&self) -> usize;
    /// Point by its stable index `0..len()`
    fn point(&self, idx: usize) -> &[f64];
    /// Pairwise distances covering at least `0..len()`
    fn distance_matrix(&self) -> Result<&DistanceMatrix>;
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub name: String,
    points: Vec<Vec<f64>>,
    labels: Option<Vec<usize>>,
    matrix: OnceLock<DistanceMatrix>,
}

impl Dataset {
    pub fn new(name: &str, points: Vec<Vec<f64>>) -> Self {
        Self { name: name.to_string(), points, labels: None, matrix: OnceLock::new() }
    }

    /// Dataset carrying ground-truth labels (e.g. from a generator)
    pub fn with_labels(name: &str, points: Vec<Vec<f64>>, labels: Vec<usize>) -> Self {
        Self { labels: Some(labels), ..Self::new(name, points) }
    }

    /// Install a prebuilt matrix. Fails if it does not cover every point.
    pub fn with_distance_matrix(self, matrix: DistanceMatrix) -> Result<Self> {
        matrix.check_covers(self.points.len())?;
        let cache = OnceLock::new();
        let _ = cache.set(matrix);
        Ok(Self { matrix: cache, ..self })
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn labels(&self) -> Option<&[usize]> {
        self.labels.as_deref()
    }

    /// Whether the distance matrix has been built already
    pub fn has_distance_matrix(&self) -> bool {
        self.matrix.get().is_some()
    }

    /// The first `len` points, sharing this dataset's cached matrix
    pub fn prefix(&self, len: usize) -> DatasetView<'_> {
        DatasetView { parent: self, len: len.min(self.points.len()) }
    }
}

impl ClusterData for Dataset {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn dim(&self) -> usize {
        self.points.first().map(|p| p.len()).unwrap_or(0)
    }

    fn point(&self, idx: usize) -> &[f64] {
        &self.points[idx]
    }

    fn distance_matrix(&self) -> Result<&DistanceMatrix> {
        if let Some(matrix) = self.matrix.get() {
            return Ok(matrix);
        }
        let built = DistanceMatrix::build(self)?;
        Ok(self.matrix.get_or_init(|| built))
    }
}

/// Leading slice of a [`Dataset`]
#[derive(Clone, Copy, Debug)]
pub struct DatasetView<'a> {
    parent: &'a Dataset,
    len: usize,
}

impl DatasetView<'_> {
    pub fn name(&self) -> &str {
        &self.parent.name
    }

    pub fn labels(&self) -> Option<&[usize]> {
        self.parent.labels().map(|labels| &labels[..self.len.min(labels.len())])
    }
}

impl ClusterData for DatasetView<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn dim(&self) -> usize {
        self.parent.dim()
    }

    fn point(&self, idx: usize) -> &[f64] {
        debug_assert!(idx < self.len);
        self.parent.point(idx)
    }

    fn distance_matrix(&self) -> Result<&DistanceMatrix> {
        self.parent.distance_matrix()
    }
}
