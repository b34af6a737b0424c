//! Nearest-neighbor affinity graph construction
//!
//! Builds the symmetric sparse similarity graph that spectral embedding
//! decomposes: a directed k-nearest-neighbor connectivity graph over the
//! embedding vectors, symmetrized as `0.5 * (G + Gᵗ)` so that a mutual
//! neighbor pair carries weight 1 and a unilateral one weight 0.5.

use ndarray::ArrayView2;
use tracing::debug;

use crate::error::ConfigError;
use crate::sparse::CsrMatrix;

/// Build the symmetrized k-NN affinity graph over one recording's embeddings
///
/// Neighbors are selected by Euclidean distance with deterministic
/// tie-breaking on index. `include_self` counts each point as its own
/// nearest neighbor (a self-loop the Laplacian later strips, so it affects
/// normalization only). When `neighbors` is not smaller than the number of
/// points, every available pair is connected and the graph degrades to a
/// dense affinity.
///
/// # Errors
/// `ConfigError` if `neighbors < 1` or fewer than 2 embeddings are supplied.
pub fn build_knn_affinity(
    embeddings: ArrayView2<f32>,
    neighbors: usize,
    include_self: bool,
) -> Result<CsrMatrix, ConfigError> {
    let n = embeddings.nrows();
    if neighbors < 1 {
        return Err(ConfigError::InvalidNeighborCount(neighbors));
    }
    if n < 2 {
        return Err(ConfigError::TooFewSegments(n));
    }

    let mut triplets = Vec::with_capacity(2 * n * neighbors.min(n));
    let mut candidates: Vec<(f64, usize)> = Vec::with_capacity(n);

    for i in 0..n {
        let anchor = embeddings.row(i);
        candidates.clear();
        for j in 0..n {
            if j == i && !include_self {
                continue;
            }
            let dist2: f64 = anchor
                .iter()
                .zip(embeddings.row(j).iter())
                .map(|(a, b)| {
                    let d = f64::from(a - b);
                    d * d
                })
                .sum();
            candidates.push((dist2, j));
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for &(_, j) in candidates.iter().take(neighbors) {
            // Half weight per direction; duplicates sum to a mutual edge of 1
            triplets.push((i, j, 0.5));
            triplets.push((j, i, 0.5));
        }
    }

    let affinity = CsrMatrix::from_triplets(n, triplets);
    debug_assert!(affinity.is_symmetric(1e-12));
    debug!(
        "Built affinity graph: {} nodes, {} edges",
        affinity.n(),
        affinity.nnz()
    );
    Ok(affinity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rejects_bad_config() {
        let points = array![[0.0f32, 0.0], [1.0, 0.0]];
        assert!(matches!(
            build_knn_affinity(points.view(), 0, false),
            Err(ConfigError::InvalidNeighborCount(0))
        ));

        let single = array![[0.0f32, 0.0]];
        assert!(matches!(
            build_knn_affinity(single.view(), 1, false),
            Err(ConfigError::TooFewSegments(1))
        ));
    }

    #[test]
    fn test_symmetric_with_zero_diagonal() {
        let points = array![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]];
        let affinity = build_knn_affinity(points.view(), 2, false).unwrap();

        assert!(affinity.is_symmetric(1e-12));
        for i in 0..4 {
            assert_eq!(affinity.get(i, i), 0.0);
        }
    }

    #[test]
    fn test_mutual_and_unilateral_weights() {
        // 0 and 1 are each other's nearest neighbor; 2 is far away and picks
        // 0, which does not pick it back.
        let points = array![[0.0f32], [1.0], [10.0]];
        let affinity = build_knn_affinity(points.view(), 1, false).unwrap();

        assert!((affinity.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((affinity.get(1, 0) - 1.0).abs() < 1e-12);
        assert!((affinity.get(2, 1) - 0.5).abs() < 1e-12);
        assert!((affinity.get(1, 2) - 0.5).abs() < 1e-12);
        assert_eq!(affinity.get(0, 2), 0.0);
    }

    #[test]
    fn test_include_self_adds_unit_diagonal() {
        let points = array![[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let affinity = build_knn_affinity(points.view(), 2, true).unwrap();
        for i in 0..3 {
            assert!((affinity.get(i, i) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_neighbors_exceeding_points_degrades_to_dense() {
        let points = array![[0.0f32], [1.0], [2.0]];
        let affinity = build_knn_affinity(points.view(), 10, false).unwrap();

        // All off-diagonal pairs mutual
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert!((affinity.get(i, j) - 1.0).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_weights_bounded_by_one() {
        let points = array![[0.0f32, 1.0], [0.5, 0.5], [1.0, 0.0], [2.0, 2.0], [3.0, 0.0]];
        let affinity = build_knn_affinity(points.view(), 3, false).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                assert!(affinity.get(i, j) <= 1.0 + 1e-12);
            }
        }
    }
}
