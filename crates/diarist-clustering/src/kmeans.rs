//! Centroid partitioning of spectral points
//!
//! Lloyd's algorithm with k-means++ seeding. The objective is non-convex,
//! so several independently seeded runs are made and the lowest-inertia
//! labeling kept. All randomness comes from the caller's seed; cluster ids
//! are an arbitrary permutation of `0..k` with no meaning across recordings.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// K-means options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Base seed; restart `r` uses `seed + r`
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iterations: 300,
            seed: 1234,
        }
    }
}

/// Assign one of `k` cluster labels to every point
///
/// Deterministic for a fixed seed. `k == N` degenerates to one point per
/// cluster and is allowed.
///
/// # Errors
/// `ConfigError` if `k` is zero or exceeds the number of points.
pub fn kmeans_assign(
    points: ArrayView2<f64>,
    k: usize,
    config: &KMeansConfig,
) -> Result<Vec<usize>, ConfigError> {
    let n = points.nrows();
    if k == 0 {
        return Err(ConfigError::ZeroClusters);
    }
    if k > n {
        return Err(ConfigError::TooManyClusters { requested: k, available: n });
    }

    let mut best: Option<(f64, Vec<usize>)> = None;
    for restart in 0..config.n_init.max(1) {
        let seed = config.seed.wrapping_add(restart as u64);
        let (labels, inertia) = lloyd_run(points, k, seed, config.max_iterations);
        if best.as_ref().map_or(true, |(best_inertia, _)| inertia < *best_inertia) {
            best = Some((inertia, labels));
        }
    }

    let (inertia, labels) = best.unwrap_or((0.0, Vec::new()));
    debug!("k-means: k={}, inertia={:.6}", k, inertia);
    Ok(labels)
}

/// One seeded k-means++ initialization followed by Lloyd iterations
fn lloyd_run(
    points: ArrayView2<f64>,
    k: usize,
    seed: u64,
    max_iterations: usize,
) -> (Vec<usize>, f64) {
    let (n, dim) = points.dim();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = plus_plus_init(points, k, &mut rng);

    let mut labels = vec![0usize; n];
    let mut distances = vec![0.0f64; n];

    for _ in 0..max_iterations {
        // Assignment step
        let mut changed = false;
        for i in 0..n {
            let (label, dist2) = nearest_centroid(points.row(i), &centroids);
            if labels[i] != label {
                labels[i] = label;
                changed = true;
            }
            distances[i] = dist2;
        }

        // Repair empty clusters with the point farthest from its centroid
        for cluster in 0..k {
            if labels.iter().any(|&l| l == cluster) {
                continue;
            }
            let farthest = distances
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            labels[farthest] = cluster;
            distances[farthest] = 0.0;
            changed = true;
        }

        if !changed {
            break;
        }

        // Update step
        let mut sums = Array2::<f64>::zeros((k, dim));
        let mut counts = vec![0usize; k];
        for i in 0..n {
            let mut row = sums.row_mut(labels[i]);
            row += &points.row(i);
            counts[labels[i]] += 1;
        }
        for cluster in 0..k {
            if counts[cluster] > 0 {
                let mut row = sums.row_mut(cluster);
                row.mapv_inplace(|v| v / counts[cluster] as f64);
                centroids.row_mut(cluster).assign(&sums.row(cluster));
            }
        }
    }

    let inertia = distances.iter().sum();
    (labels, inertia)
}

/// k-means++ seeding: spread the initial centroids proportionally to the
/// squared distance from the centers already chosen
fn plus_plus_init(points: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let (n, dim) = points.dim();
    let mut centroids = Array2::zeros((k, dim));
    let mut chosen = vec![false; n];

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&points.row(first));
    chosen[first] = true;

    let mut dist2 = Array1::from_shape_fn(n, |i| squared_distance(points.row(i), centroids.row(0)));

    for c in 1..k {
        let total: f64 = dist2.sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen_range(0.0..total);
            let mut pick = n - 1;
            for (i, &d) in dist2.iter().enumerate() {
                if target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // All remaining mass is zero (duplicate points, or k == N with
            // every point already a center): take the first unused point
            (0..n).find(|&i| !chosen[i]).unwrap_or(0)
        };

        chosen[pick] = true;
        centroids.row_mut(c).assign(&points.row(pick));
        for i in 0..n {
            let d = squared_distance(points.row(i), centroids.row(c));
            if d < dist2[i] {
                dist2[i] = d;
            }
        }
    }

    centroids
}

fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (label, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (label, d);
        }
    }
    best
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
        ]
    }

    #[test]
    fn test_separates_well_spaced_blobs() {
        let points = two_blobs();
        let labels = kmeans_assign(points.view(), 2, &KMeansConfig::default()).unwrap();

        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_labels_in_range() {
        let points = two_blobs();
        let labels = kmeans_assign(points.view(), 3, &KMeansConfig::default()).unwrap();
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let points = two_blobs();
        let config = KMeansConfig { seed: 7, ..KMeansConfig::default() };
        let a = kmeans_assign(points.view(), 2, &config).unwrap();
        let b = kmeans_assign(points.view(), 2, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_k_equals_n_succeeds() {
        let points = two_blobs();
        let labels = kmeans_assign(points.view(), 6, &KMeansConfig::default()).unwrap();

        // Every point its own cluster
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_k_above_n_rejected() {
        let points = two_blobs();
        let err = kmeans_assign(points.view(), 7, &KMeansConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManyClusters { requested: 7, available: 6 }
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        let points = two_blobs();
        assert!(matches!(
            kmeans_assign(points.view(), 0, &KMeansConfig::default()),
            Err(ConfigError::ZeroClusters)
        ));
    }

    #[test]
    fn test_duplicate_points() {
        let points = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [5.0, 5.0]];
        let labels = kmeans_assign(points.view(), 2, &KMeansConfig::default()).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_ne!(labels[0], labels[3]);
    }
}
