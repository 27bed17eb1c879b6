use thiserror::Error;

/// Errors returned by the clustering engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KbrainError {
    /// Requested cluster count is outside `1..=n`.
    #[error("invalid cluster count: requested {k}, but dataset has {n} points")]
    InvalidK {
        /// Requested number of clusters.
        k: usize,
        /// Number of points in the dataset.
        n: usize,
    },

    /// Two points (or a point and a matrix) disagree on size.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Update-strategy selector is not one of `k-means` / `k-medoids`.
    #[error("invalid algorithm: {0:?}")]
    InvalidAlgorithm(String),

    /// A cluster received no points during an update. Handled by keeping
    /// the previous center; surfaced through diagnostics only.
    #[error("cluster {cluster} received no points")]
    EmptyCluster {
        /// Index of the empty cluster.
        cluster: usize,
    },

    /// The iteration cap was reached before centers stopped moving.
    #[error("did not converge after {iterations} iterations")]
    NonConvergence {
        /// Number of iterations attempted.
        iterations: usize,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, KbrainError>;
