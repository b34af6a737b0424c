//! Spectral clustering facade
//!
//! Chains the three stages of the per-recording clustering pipeline:
//! k-NN affinity graph over the embeddings, spectral embedding of the graph,
//! and k-means on the spectral points. The cluster count is always supplied
//! by the caller (oracle or externally tuned), never estimated here.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::affinity::build_knn_affinity;
use crate::error::ConfigError;
use crate::kmeans::{kmeans_assign, KMeansConfig};
use crate::spectral::{spectral_embed, SpectralConfig};

/// Spectral clustering options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Nearest neighbors per node in the affinity graph
    pub neighbors: usize,
    /// Count each point as its own neighbor
    pub include_self: bool,
    /// k-means restarts
    pub n_init: usize,
    /// Seed for the eigensolver and k-means
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            neighbors: 10,
            include_self: false,
            n_init: 10,
            seed: 1234,
        }
    }
}

/// Graph-based spectral clusterer for one recording's embeddings
pub struct SpectralClusterer {
    config: ClusterConfig,
}

impl SpectralClusterer {
    /// Create a new clusterer with the given configuration
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster embeddings into `k` groups, returning one label per row
    ///
    /// Labels are integers in `[0, k)`; their values are an arbitrary
    /// permutation and carry no meaning across recordings.
    ///
    /// # Errors
    /// `ConfigError` on fewer than 2 embeddings, a neighbor count below 1,
    /// or `k` outside `[1, N]`.
    pub fn cluster(&self, embeddings: ArrayView2<f32>, k: usize) -> Result<Vec<usize>, ConfigError> {
        let n = embeddings.nrows();
        if k > n {
            return Err(ConfigError::TooManyClusters { requested: k, available: n });
        }

        debug!("Clustering {} embeddings into {} groups", n, k);

        let affinity = build_knn_affinity(embeddings, self.config.neighbors, self.config.include_self)?;

        // The k-means path keeps the leading eigenvector: dropping it is only
        // worthwhile when the embedding itself is the product
        let spectral_config = SpectralConfig {
            n_components: k,
            normalized: true,
            drop_first: false,
            seed: self.config.seed,
        };
        let points = spectral_embed(&affinity, &spectral_config)?;

        let kmeans_config = KMeansConfig {
            n_init: self.config.n_init,
            seed: self.config.seed,
            ..KMeansConfig::default()
        };
        kmeans_assign(points.view(), k, &kmeans_config)
    }
}

impl Default for SpectralClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Embeddings in two tight groups along orthogonal directions
    fn two_speaker_embeddings() -> Array2<f32> {
        let mut points = Array2::zeros((8, 16));
        for i in 0..4 {
            points[[i, 0]] = 1.0;
            points[[i, 1]] = 0.05 * i as f32;
        }
        for i in 4..8 {
            points[[i, 2]] = 1.0;
            points[[i, 3]] = 0.05 * (i - 4) as f32;
        }
        points
    }

    fn config() -> ClusterConfig {
        ClusterConfig { neighbors: 3, ..ClusterConfig::default() }
    }

    #[test]
    fn test_two_groups_recovered() {
        let embeddings = two_speaker_embeddings();
        let clusterer = SpectralClusterer::new(config());
        let labels = clusterer.cluster(embeddings.view(), 2).unwrap();

        assert_eq!(labels.len(), 8);
        for i in 1..4 {
            assert_eq!(labels[i], labels[0]);
        }
        for i in 5..8 {
            assert_eq!(labels[i], labels[4]);
        }
        assert_ne!(labels[0], labels[4]);
    }

    #[test]
    fn test_pipeline_deterministic() {
        let embeddings = two_speaker_embeddings();
        let clusterer = SpectralClusterer::new(config());
        let a = clusterer.cluster(embeddings.view(), 2).unwrap();
        let b = clusterer.cluster(embeddings.view(), 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_k_above_n_rejected() {
        let embeddings = two_speaker_embeddings();
        let clusterer = SpectralClusterer::new(config());
        assert!(matches!(
            clusterer.cluster(embeddings.view(), 9),
            Err(ConfigError::TooManyClusters { requested: 9, available: 8 })
        ));
    }
}
