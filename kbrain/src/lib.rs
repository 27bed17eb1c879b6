//! k-means / k-medoids clustering engine
//!
//! Points are assigned to the nearest of `k` centers and centers are
//! recomputed until they stop moving. Centers are either arithmetic means
//! ([`Algorithm::Mean`]) or dataset points chosen by an exhaustive medoid
//! search over a precomputed [`DistanceMatrix`] ([`Algorithm::Medoid`]).

pub mod dataset;
pub mod distance_matrix;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod types;
mod euclidean_centers;
mod init_centers;
mod medoid_centers;

pub use dataset::{ClusterData, Dataset, DatasetView};
pub use distance_matrix::{build_distance_matrix, DistanceMatrix};
pub use engine::{run, KBrain, DEFAULT_MAX_ITERATION};
pub use error::{KbrainError, Result};
pub use init_centers::{plusplus_indices, random_indices};
pub use medoid_centers::best_medoid;
pub use types::{Algorithm, Center, CenterSet, ClusterAssignment, Diagnostic, EuclideanDistance, Initialization, RunResult};
