use std::path::Path;

use anyhow::{bail, Context};
use csv::{ReaderBuilder, Trim};
use kbrain::Dataset;

/// Column holding ground-truth labels; every other column is a coordinate
pub const LABEL_COLUMN: &str = "y";

pub async fn load_csv(path: &Path) -> anyhow::Result<Dataset> {
    let contents = tokio::fs::read_to_string(path).await
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let name = path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_csv(&name, &contents)
        .with_context(|| format!("Invalid dataset {}", path.display()))
}

/// Parse a headed csv. Both `,` and `;` separated files are accepted.
pub fn parse_csv(name: &str, contents: &str) -> anyhow::Result<Dataset> {
    let header = contents.lines().next().unwrap_or_default();
    let delimiter = if !header.contains(',') && header.contains(';') { b';' } else { b',' };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(contents.as_bytes());

    let headers = reader.headers().context("Missing header row")?.clone();
    let label_column = headers.iter().position(|h| h == LABEL_COLUMN);
    if headers.len() - usize::from(label_column.is_some()) == 0 {
        bail!("No coordinate columns in header");
    }

    let mut points = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // Row 1 is the header
        let line = row + 2;
        let record = record.with_context(|| format!("Malformed row {line}"))?;
        let mut point = Vec::with_capacity(record.len());
        for (column, field) in record.iter().enumerate() {
            if Some(column) == label_column {
                let label = field.parse::<usize>()
                    .with_context(|| format!("Row {line}, column `{}`: bad label {field:?}", &headers[column]))?;
                labels.push(label);
            } else {
                let value = field.parse::<f64>()
                    .with_context(|| format!("Row {line}, column `{}`: bad number {field:?}", &headers[column]))?;
                point.push(value);
            }
        }
        points.push(point);
    }

    Ok(match label_column {
        Some(_) => Dataset::with_labels(name, points, labels),
        None => Dataset::new(name, points),
    })
}
