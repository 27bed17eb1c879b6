//! Experiment driver
//!
//! Runs every selected algorithm over every dataset, sample count and trial
//! of the settings grid and collects one [`ExperimentResult`] per run.

use std::{fmt, str::FromStr, time::Instant};

use kbrain::{Algorithm, ClusterData, Dataset, DatasetView, Initialization, KBrain, KbrainError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{dbscan::Dbscan, settings::Settings};

/// Algorithm selector of the driver: an engine strategy or DBSCAN
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Engine(Algorithm),
    Dbscan,
}

impl FromStr for Method {
    type Err = KbrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "DBSCAN" {
            return Ok(Method::Dbscan);
        }
        s.parse().map(Method::Engine)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Engine(algorithm) => write!(f, "{algorithm}"),
            Method::Dbscan => f.write_str("DBSCAN"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Params {
    Clusters { k: usize },
    Density { epsilon: f64, min_pts: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Clustered {
        /// `None` marks DBSCAN noise
        labels: Vec<Option<usize>>,
        centers: Vec<Vec<f64>>,
        iterations: usize,
        cost: Option<f64>,
        elapsed_ms: f64,
    },
    Failed { error: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExperimentResult {
    pub algorithm: String,
    pub dataset: String,
    /// Position of the dataset in [`Experiment::datasets`]
    #[serde(skip)]
    pub dataset_index: usize,
    pub samples: usize,
    pub trial: usize,
    pub params: Params,
    pub outcome: Outcome,
}

pub struct Experiment {
    pub datasets: Vec<Dataset>,
    pub settings: Settings,
}

impl Experiment {
    pub fn new(datasets: Vec<Dataset>, settings: Settings) -> Self {
        Self { datasets, settings }
    }

    /// Parse algorithm selectors, failing on the first unknown one
    pub fn methods<S: AsRef<str>>(names: &[S]) -> kbrain::Result<Vec<Method>> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }

    /// Build each dataset's distance matrix once, before any run
    pub fn calculate_distances(&self) -> kbrain::Result<()> {
        for dataset in &self.datasets {
            let start = Instant::now();
            dataset.distance_matrix()?;
            info!(dataset = %dataset.name, points = dataset.len(), elapsed = ?start.elapsed(), "distance matrix ready");
        }
        Ok(())
    }

    pub fn run(&self, methods: &[Method]) -> Vec<ExperimentResult> {
        let settings = &self.settings;
        let mut results = Vec::new();

        for method in methods {
            for (dataset_index, dataset) in self.datasets.iter().enumerate() {
                for &num in &settings.num_samples {
                    let view = dataset.prefix(num);
                    if view.len() < num {
                        warn!(dataset = %dataset.name, requested = num, available = view.len(), "sample count clipped");
                    }
                    for trial in 1..=settings.num_runs {
                        let record = |params, outcome| ExperimentResult {
                            algorithm: method.to_string(),
                            dataset: dataset.name.clone(),
                            dataset_index,
                            samples: view.len(),
                            trial,
                            params,
                            outcome,
                        };
                        match method {
                            Method::Engine(algorithm) => {
                                for &k in &settings.clusters {
                                    let seed = settings.seed.wrapping_add(trial as u64);
                                    results.push(record(Params::Clusters { k }, self.run_engine(*algorithm, k, &view, seed)));
                                }
                            }
                            Method::Dbscan => {
                                for &epsilon in &settings.epsilons {
                                    for &min_pts in &settings.min_pts {
                                        results.push(record(Params::Density { epsilon, min_pts }, run_dbscan(epsilon, min_pts, &view)));
                                    }
                                }
                            }
                        }
                    }
                }
            }
            info!(algorithm = %method, runs = results.len(), "algorithm finished");
        }
        results
    }

    fn run_engine(&self, algorithm: Algorithm, k: usize, view: &DatasetView, seed: u64) -> Outcome {
        let init = if self.settings.plusplus { Initialization::PlusPlus } else { Initialization::Random };
        let start = Instant::now();
        let mut model = KBrain::new(k, algorithm, Some(init), seed, Some(self.settings.max_iteration));
        match model.fit(view) {
            Ok(result) => Outcome::Clustered {
                labels: result.assignment.into_iter().map(Some).collect(),
                centers: result.centers.iter().map(|c| c.point().to_vec()).collect(),
                iterations: result.iterations,
                cost: Some(result.cost),
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
            Err(err) => {
                warn!(%algorithm, k, dataset = view.name(), %err, "run failed");
                Outcome::Failed { error: err.to_string() }
            }
        }
    }
}

fn run_dbscan(epsilon: f64, min_pts: usize, view: &DatasetView) -> Outcome {
    let start = Instant::now();
    match Dbscan::new(epsilon, min_pts).fit(view) {
        Ok(labels) => {
            debug!(epsilon, min_pts, clusters = labels.iter().flatten().max().map_or(0, |c| c + 1), "dbscan done");
            Outcome::Clustered {
                labels,
                centers: Vec::new(),
                iterations: 0,
                cost: None,
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            }
        }
        Err(err) => Outcome::Failed { error: format!("{err:#}") },
    }
}
