//! Synthetic 2-D datasets with ground-truth labels
//!
//! Points are generated class by class and shuffled at the end, so a prefix
//! of any length mixes every class.

use anyhow::{ensure, Context};
use kbrain::Dataset;
use rand::{seq::SliceRandom, RngExt, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::settings::SyntheticKind;

const CIRCLES_FACTOR: f64 = 0.5;
const BLOB_CENTERS: usize = 3;
const BLOB_STD: f64 = 1.0;
const BLOB_BOX: (f64, f64) = (-10.0, 10.0);

type Samples = Vec<(Vec<f64>, usize)>;

pub fn generate(kind: SyntheticKind, n: usize, noise: f64, seed: u64) -> anyhow::Result<Dataset> {
    ensure!(noise.is_finite() && noise >= 0.0, "Noise must be a non-negative number, got {noise}");
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut samples = match kind {
        SyntheticKind::Circles => circles(n, noise, &mut rng)?,
        SyntheticKind::Moons => moons(n, noise, &mut rng)?,
        SyntheticKind::Blobs => blobs(n, &mut rng)?,
    };
    samples.shuffle(&mut rng);
    let (points, labels) = samples.into_iter().unzip();
    Ok(Dataset::with_labels(kind.name(), points, labels))
}

fn linspace(start: f64, stop: f64, num: usize, endpoint: bool) -> Vec<f64> {
    let intervals = if endpoint { num.saturating_sub(1) } else { num };
    if intervals == 0 {
        return vec![start; num];
    }
    let step = (stop - start) / intervals as f64;
    (0..num).map(|i| start + step * i as f64).collect()
}

fn jitter(noise: f64) -> anyhow::Result<Normal<f64>> {
    Normal::new(0.0, noise).with_context(|| format!("Invalid noise level {noise}"))
}

/// Large circle (label 0) around a smaller one (label 1)
fn circles(n: usize, noise: f64, rng: &mut ChaCha20Rng) -> anyhow::Result<Samples> {
    let normal = jitter(noise)?;
    let n_out = n / 2;
    let n_in = n - n_out;

    let mut samples = Vec::with_capacity(n);
    for (count, radius, label) in [(n_out, 1.0, 0), (n_in, CIRCLES_FACTOR, 1)] {
        for angle in linspace(0.0, 2.0 * PI, count, false) {
            samples.push((vec![
                radius * angle.cos() + normal.sample(rng),
                radius * angle.sin() + normal.sample(rng),
            ], label));
        }
    }
    Ok(samples)
}

/// Two interleaving half circles
fn moons(n: usize, noise: f64, rng: &mut ChaCha20Rng) -> anyhow::Result<Samples> {
    let normal = jitter(noise)?;
    let n_out = n / 2;
    let n_in = n - n_out;

    let mut samples = Vec::with_capacity(n);
    for angle in linspace(0.0, PI, n_out, true) {
        samples.push((vec![angle.cos() + normal.sample(rng), angle.sin() + normal.sample(rng)], 0));
    }
    for angle in linspace(0.0, PI, n_in, true) {
        samples.push((vec![
            1.0 - angle.cos() + normal.sample(rng),
            0.5 - angle.sin() + normal.sample(rng),
        ], 1));
    }
    Ok(samples)
}

/// Isotropic Gaussian blobs around centers drawn uniformly from the box
fn blobs(n: usize, rng: &mut ChaCha20Rng) -> anyhow::Result<Samples> {
    let normal = jitter(BLOB_STD)?;
    let centers: Vec<[f64; 2]> = (0..BLOB_CENTERS)
        .map(|_| [rng.random_range(BLOB_BOX.0..BLOB_BOX.1), rng.random_range(BLOB_BOX.0..BLOB_BOX.1)])
        .collect();

    let mut samples = Vec::with_capacity(n);
    for (label, center) in centers.iter().enumerate() {
        // Leftover points go to the first blobs
        let count = n / BLOB_CENTERS + usize::from(label < n % BLOB_CENTERS);
        for _ in 0..count {
            samples.push((vec![center[0] + normal.sample(rng), center[1] + normal.sample(rng)], label));
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbrain::ClusterData;

    #[test]
    fn sizes_and_labels() {
        for kind in [SyntheticKind::Circles, SyntheticKind::Moons, SyntheticKind::Blobs] {
            let dataset = generate(kind, 101, 0.05, 7).unwrap();
            assert_eq!(dataset.len(), 101);
            assert_eq!(dataset.dim(), 2);
            assert_eq!(dataset.name, kind.name());
            let labels = dataset.labels().unwrap();
            assert_eq!(labels.len(), 101);
            let classes = if kind == SyntheticKind::Blobs { 3 } else { 2 };
            assert!(labels.iter().all(|l| *l < classes));
        }
    }

    #[test]
    fn seeded() {
        let a = generate(SyntheticKind::Moons, 50, 0.05, 3).unwrap();
        let b = generate(SyntheticKind::Moons, 50, 0.05, 3).unwrap();
        let c = generate(SyntheticKind::Moons, 50, 0.05, 4).unwrap();
        assert_eq!(a.points(), b.points());
        assert_ne!(a.points(), c.points());
    }

    #[test]
    fn circles_without_noise_lie_on_two_radii() {
        let dataset = generate(SyntheticKind::Circles, 40, 0.0, 1).unwrap();
        for (point, label) in dataset.points().iter().zip(dataset.labels().unwrap()) {
            let radius = (point[0] * point[0] + point[1] * point[1]).sqrt();
            let expected = if *label == 0 { 1.0 } else { CIRCLES_FACTOR };
            assert!((radius - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn prefix_mixes_classes() {
        let dataset = generate(SyntheticKind::Blobs, 300, 0.05, 0).unwrap();
        let head = &dataset.labels().unwrap()[..30];
        assert!(head.iter().any(|l| *l != head[0]));
    }

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(0.0, 1.0, 3, true), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(0.0, 1.0, 2, false), vec![0.0, 0.5]);
        assert_eq!(linspace(0.0, 1.0, 1, true), vec![0.0]);
        assert!(linspace(0.0, 1.0, 0, true).is_empty());
    }

    #[test]
    fn negative_noise_fails() {
        assert!(generate(SyntheticKind::Circles, 10, -1.0, 0).is_err());
        assert!(generate(SyntheticKind::Blobs, 10, -0.5, 0).is_err());
        assert!(generate(SyntheticKind::Moons, 10, f64::NAN, 0).is_err());
        assert!(generate(SyntheticKind::Moons, 10, 0.0, 0).is_ok());
    }
}
