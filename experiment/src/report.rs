use std::fmt;

use anyhow::Context;
use kbrain::metrics::cluster_sizes;

use crate::experiment::{ExperimentResult, Outcome, Params};

/// Plain text report, one block per run
pub struct Report<'a>(pub &'a [ExperimentResult]);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analyse Results\n")?;
        self.0.iter().try_for_each(|result| write_result(f, result))
    }
}

pub fn format_results(results: &[ExperimentResult]) -> String {
    Report(results).to_string()
}

fn write_result(f: &mut fmt::Formatter<'_>, result: &ExperimentResult) -> fmt::Result {
    writeln!(f, "Experiment:")?;
    writeln!(f, "\tAlgorithm: {}", result.algorithm)?;
    writeln!(f, "\tDataset Name: {}", result.dataset)?;
    writeln!(f, "\tNum Datapoints: {}", result.samples)?;
    writeln!(f, "\tTrial Number: {}", result.trial)?;
    match &result.params {
        Params::Clusters { k } => writeln!(f, "\tNumber Clusters: {k}")?,
        Params::Density { epsilon, min_pts } => {
            writeln!(f, "\tEpsilon: {epsilon}")?;
            writeln!(f, "\tMin Points: {min_pts}")?;
        }
    }
    match &result.outcome {
        Outcome::Clustered { labels, iterations, cost, elapsed_ms, .. } => {
            if let Some(cost) = cost {
                writeln!(f, "\tIterations: {iterations}")?;
                writeln!(f, "\tCost: {cost:.6}")?;
            }
            writeln!(f, "\tTime (ms): {elapsed_ms:.3}")?;
            writeln!(f, "\tCluster Sizes: {}", format_sizes(&result.params, labels))?;
            writeln!(f, "Cluster Assignments:\n")?;
            writeln!(f, "{}\n", format_labels(labels))
        }
        Outcome::Failed { error } => writeln!(f, "\tError: {error}\n"),
    }
}

/// Members per cluster; empty k-based clusters show as 0, DBSCAN noise is
/// counted separately
fn format_sizes(params: &Params, labels: &[Option<usize>]) -> String {
    let assigned: Vec<usize> = labels.iter().flatten().copied().collect();
    let found = assigned.iter().max().map_or(0, |c| c + 1);
    let clusters = match params {
        Params::Clusters { k } => found.max(*k),
        Params::Density { .. } => found,
    };
    let sizes = cluster_sizes(&assigned, clusters).iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    match params {
        Params::Clusters { .. } => format!("[{sizes}]"),
        Params::Density { .. } => format!("[{sizes}] noise {}", labels.len() - assigned.len()),
    }
}

/// Space separated labels, `-1` for noise
fn format_labels(labels: &[Option<usize>]) -> String {
    let body = labels.iter()
        .map(|label| label.map_or("-1".to_string(), |l| l.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{body}]")
}

pub fn to_json(results: &[ExperimentResult]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize results")
}
