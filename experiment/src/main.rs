//! Clustering experiment runner
//! Loads a csv dataset and/or generates synthetic ones, runs k-means,
//! k-medoids and DBSCAN over the settings grid and reports every run.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use kbrain::Dataset;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use experiment::{Experiment, Method};
use generate::generate;
use loading::load_csv;
use settings::Settings;

// Module declarations
mod dbscan;
mod experiment;
mod generate;
mod loading;
mod plot;
mod report;
mod settings;

/// Command-line arguments for the experiment runner
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a csv dataset (header row, optional `y` label column)
    #[arg(short = 'd', long)]
    pub dataset: Option<PathBuf>,
    /// Generate the synthetic datasets listed in the settings
    #[arg(short = 'g', long)]
    pub generate: bool,
    /// Run every algorithm from the settings
    #[arg(short = 'e', long)]
    pub experiment: bool,
    /// Run k-means
    #[arg(short = 'm', long)]
    pub kmeans: bool,
    /// Run k-medoids
    #[arg(short = 'o', long)]
    pub kmedoids: bool,
    /// Run DBSCAN
    #[arg(short = 's', long)]
    pub dbscan: bool,
    /// RON settings file (defaults are used for missing fields)
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Base random seed, overrides the settings file
    #[arg(long)]
    pub seed: Option<u64>,
    /// Iteration cap of the k-based algorithms, overrides the settings file
    #[arg(long)]
    pub max_iter: Option<usize>,
    /// Write an svg scatter per run into this directory
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,
    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

const USAGE: &str = "\
Choose one of the following:
-d or --dataset {./dataset.csv}
-g or --generate to generate several dataset types

Choose one of the following:
-e or --experiment to run all algorithms
-m or --kmeans to run only the k-means algorithm
-o or --kmedoids to run only the k-medoids algorithm
-s or --dbscan to run only the dbscan algorithm";

impl Args {
    /// Algorithm selectors: the settings list for `--experiment`, plus any
    /// single-algorithm flag not already in it
    fn algorithm_names(&self, settings: &Settings) -> Vec<String> {
        let mut names = if self.experiment { settings.algorithms.clone() } else { Vec::new() };
        for (on, name) in [(self.kmeans, "k-means"), (self.kmedoids, "k-medoids"), (self.dbscan, "DBSCAN")] {
            if on && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

async fn ready_datasets(args: &Args, settings: &Settings) -> anyhow::Result<Vec<Dataset>> {
    let mut datasets = Vec::new();
    if let Some(path) = &args.dataset {
        let dataset = load_csv(path).await?;
        info!(path = %path.display(), points = dataset.points().len(), "dataset read");
        datasets.push(dataset);
    }
    if args.generate {
        for kind in &settings.dataset_types {
            let dataset = generate(*kind, settings.max_samples, settings.noise, settings.seed)?;
            info!(dataset = kind.name(), points = settings.max_samples, "dataset generated");
            datasets.push(dataset);
        }
    }
    Ok(datasets)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Args = Args::parse();
    if args.dataset.is_none() && !args.generate {
        eprintln!("\nPlease provide command line arguments\n{USAGE}\n");
        bail!("no dataset selected");
    }

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path).await?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(max_iter) = args.max_iter {
        settings.max_iteration = max_iter;
    }

    let methods = Experiment::methods(&args.algorithm_names(&settings)[..])?;
    if methods.is_empty() {
        warn!("no algorithm selected, only distance matrices are built\n{USAGE}");
    }

    let datasets = ready_datasets(&args, &settings).await?;
    let experiment = Experiment::new(datasets, settings);

    // Matrix builds and runs are CPU bound
    let (experiment, results) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        experiment.calculate_distances()?;
        let results = experiment.run(&methods);
        Ok((experiment, results))
    })
    .await
    .context("Experiment task panicked")??;

    if let Some(dir) = &args.plot_dir {
        tokio::fs::create_dir_all(dir).await
            .with_context(|| format!("Failed to create plot directory {}", dir.display()))?;
        let mut written = 0;
        for result in &results {
            if plot::scatter(result, &experiment.datasets[result.dataset_index], dir)?.is_some() {
                written += 1;
            }
        }
        info!(dir = %dir.display(), plots = written, "plots written");
    }

    if args.json {
        println!("{}", report::to_json(&results)?);
    } else {
        print!("{}", report::format_results(&results));
    }
    Ok(())
}
