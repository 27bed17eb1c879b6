use std::path::{Path, PathBuf};

use anyhow::anyhow;
use kbrain::{ClusterData, Dataset};
use plotlib::{page::Page, repr::Plot, style::{PointMarker, PointStyle}, view::ContinuousView};
use tracing::{debug, warn};

use crate::experiment::{ExperimentResult, Outcome, Params};

const COLORS: [&str; 8] = [
    "#DD3355", // Red
    "#33DD55", // Green
    "#3355DD", // Blue
    "#DDDD33", // Yellow
    "#FF7733", // Orange
    "#AA33DD", // Purple
    "#55AAAA", // Cyan
    "#DD33DD", // Magenta
];
const NOISE_COLOR: &str = "#AAAAAA";
const CENTER_COLOR: &str = "#000000";

/// File name encoding the run's coordinates in the experiment grid
pub fn file_name(result: &ExperimentResult) -> String {
    let params = match &result.params {
        Params::Clusters { k } => format!("k{k}"),
        Params::Density { epsilon, min_pts } => format!("eps{epsilon}_min{min_pts}"),
    };
    format!("{}_{}_n{}_t{}_{}.svg", result.algorithm, result.dataset, result.samples, result.trial, params)
        .replace(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')), "_")
}

/// Render a 2-D run as an svg scatter, one colour per cluster.
///
/// Returns the written path, or `None` when there is nothing to draw.
pub fn scatter(result: &ExperimentResult, dataset: &Dataset, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let Outcome::Clustered { labels, centers, .. } = &result.outcome else {
        return Ok(None);
    };
    if dataset.dim() != 2 {
        warn!(dataset = %dataset.name, dim = dataset.dim(), "only 2-D datasets are plotted");
        return Ok(None);
    }

    let clusters = labels.iter().flatten().max().map_or(0, |c| c + 1);
    let mut groups: Vec<Vec<(f64, f64)>> = vec![Vec::new(); clusters];
    let mut noise = Vec::new();
    for (idx, label) in labels.iter().enumerate() {
        let point = dataset.point(idx);
        match label {
            Some(cluster) => groups[*cluster].push((point[0], point[1])),
            None => noise.push((point[0], point[1])),
        }
    }

    let mut view = ContinuousView::new().x_label("x1").y_label("x2");
    for (cluster, group) in groups.into_iter().enumerate() {
        if group.is_empty() {
            continue;
        }
        view = view.add(Plot::new(group).point_style(
            PointStyle::new()
                .marker(PointMarker::Circle)
                .colour(COLORS[cluster % COLORS.len()])
                .size(2.0_f32),
        ));
    }
    if !noise.is_empty() {
        view = view.add(Plot::new(noise).point_style(
            PointStyle::new().marker(PointMarker::Cross).colour(NOISE_COLOR).size(2.0_f32),
        ));
    }
    if !centers.is_empty() {
        let centers = centers.iter().map(|c| (c[0], c[1])).collect();
        view = view.add(Plot::new(centers).point_style(
            PointStyle::new().marker(PointMarker::Square).colour(CENTER_COLOR).size(4.0_f32),
        ));
    }

    let path = dir.join(file_name(result));
    Page::single(&view).save(&path)
        .map_err(|err| anyhow!("Failed to save plot {}: {err}", path.display()))?;
    debug!(path = %path.display(), "plot saved");
    Ok(Some(path))
}
