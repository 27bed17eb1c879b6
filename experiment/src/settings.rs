//! Experiment settings
//! Parameter grid for an experiment run, loaded from a RON file. Every field
//! has a default, so a settings file only lists what it changes.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Synthetic dataset shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntheticKind {
    Circles,
    Moons,
    Blobs,
}

impl SyntheticKind {
    pub fn name(&self) -> &'static str {
        match self {
            SyntheticKind::Circles => "circles",
            SyntheticKind::Moons => "moons",
            SyntheticKind::Blobs => "blobs",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Algorithm selectors: `k-means`, `k-medoids`, `DBSCAN`
    pub algorithms: Vec<String>,
    /// Synthetic datasets built by `--generate`
    pub dataset_types: Vec<SyntheticKind>,
    /// Points per generated dataset
    pub max_samples: usize,
    /// Prefix sizes every algorithm is run on
    pub num_samples: Vec<usize>,
    /// Trials per combination
    pub num_runs: usize,
    /// Cluster counts tried by the k-based algorithms
    pub clusters: Vec<usize>,
    /// DBSCAN neighbourhood radii
    pub epsilons: Vec<f64>,
    /// DBSCAN core-point thresholds (the point itself included)
    pub min_pts: Vec<usize>,
    /// Gaussian noise of the circles/moons generators
    pub noise: f64,
    /// Base seed; trial `t` runs with `seed + t`
    pub seed: u64,
    pub max_iteration: usize,
    /// k-means++ seeding instead of uniform initial centers
    pub plusplus: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithms: vec!["k-means".to_string(), "k-medoids".to_string(), "DBSCAN".to_string()],
            dataset_types: vec![SyntheticKind::Circles, SyntheticKind::Moons, SyntheticKind::Blobs],
            max_samples: 300,
            num_samples: vec![100, 300],
            num_runs: 2,
            clusters: vec![1, 2, 3, 4],
            epsilons: vec![0.1, 0.2, 0.3],
            min_pts: vec![3, 5],
            noise: 0.05,
            seed: 0,
            max_iteration: kbrain::DEFAULT_MAX_ITERATION,
            plusplus: false,
        }
    }
}

impl Settings {
    pub fn from_ron(contents: &str) -> anyhow::Result<Self> {
        ron::from_str(contents).context("Failed to parse settings")
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_ron(&contents)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }
}
