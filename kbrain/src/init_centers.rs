//! Initial center selection
//! Draws k distinct dataset points as starting centers, either uniformly
//! (sampling without replacement) or with k-means++ weighting.

use rand::RngExt;

use crate::{dataset::ClusterData, error::{KbrainError, Result}, types::{EuclideanDistance, Initialization}};

impl Initialization {
    /// Select `k` distinct point indices from `data`
    ///
    /// # Errors
    /// * `InvalidK` if `k == 0` or `k > data.len()`
    /// * `DimensionMismatch` from the k-means++ distance pass
    pub fn select<D, R>(&self, k: usize, data: &D, rng: &mut R) -> Result<Vec<usize>>
    where
        D: ClusterData + ?Sized,
        R: RngExt,
    {
        match self {
            Initialization::Random => random_indices(k, data.len(), rng),
            Initialization::PlusPlus => plusplus_indices(k, data, rng),
        }
    }
}

/// Draw `k` distinct indices from `0..n` uniformly without replacement
///
/// Partial Fisher-Yates: position `i` is swapped with a uniformly chosen
/// position in `i..n`, so an index once drawn is never drawn again.
pub fn random_indices<R>(k: usize, n: usize, rng: &mut R) -> Result<Vec<usize>>
where
    R: RngExt,
{
    if k == 0 || k > n {
        return Err(KbrainError::InvalidK { k, n });
    }
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.random_range(i..n);
        pool.swap(i, j);
    }
    pool.truncate(k);
    Ok(pool)
}

/// Initialize centers with the k-means++ rule
///
/// 1. Choose the first index uniformly at random
/// 2. For each remaining center, choose an index with probability
///    proportional to its squared distance to the nearest chosen center.
///    Chosen indices weigh zero; if all remaining weights are zero (only
///    duplicates of chosen points are left) pick uniformly among unchosen.
pub fn plusplus_indices<D, R>(k: usize, data: &D, rng: &mut R) -> Result<Vec<usize>>
where
    D: ClusterData + ?Sized,
    R: RngExt,
{
    let n = data.len();
    if k == 0 || k > n {
        return Err(KbrainError::InvalidK { k, n });
    }

    let mut chosen = vec![false; n];
    let mut res_indices = Vec::with_capacity(k);

    let first = rng.random_range(0..n);
    chosen[first] = true;
    res_indices.push(first);

    // Squared distance of every point to its nearest chosen center
    let mut nearest = (0..n)
        .map(|i| data.point(i).squared_distance(data.point(first)))
        .collect::<Result<Vec<f64>>>()?;

    while res_indices.len() < k {
        let total: f64 = nearest.iter().zip(chosen.iter())
            .filter(|(_, taken)| !**taken)
            .map(|(d, _)| *d)
            .sum();

        let selected = if total > 0.0 {
            let rand_val: f64 = rng.random_range(0.0..total);
            let mut cumulative = 0.0;
            let mut selected = None;
            let mut last_candidate = None;
            for (i, d) in nearest.iter().enumerate() {
                if chosen[i] || *d <= 0.0 {
                    continue;
                }
                last_candidate = Some(i);
                cumulative += *d;
                if rand_val < cumulative {
                    selected = Some(i);
                    break;
                }
            }
            // Rounding can leave rand_val just above the final cumulative sum
            selected.or(last_candidate)
        } else {
            None
        };

        let selected = match selected {
            Some(i) => i,
            None => {
                let free: Vec<usize> = (0..n).filter(|i| !chosen[*i]).collect();
                free[rng.random_range(0..free.len())]
            }
        };

        chosen[selected] = true;
        res_indices.push(selected);
        for (i, d) in nearest.iter_mut().enumerate() {
            let candidate = data.point(i).squared_distance(data.point(selected))?;
            if candidate < *d {
                *d = candidate;
            }
        }
    }

    Ok(res_indices)
}
