//! diarist-clustering - graph-based clustering of speaker embeddings
//!
//! Turns one recording's cloud of speaker embeddings into integer cluster
//! labels: a symmetrized nearest-neighbor affinity graph, the bottom of its
//! Laplacian spectrum as a low-dimensional embedding, and seeded k-means on
//! the embedded points. Everything is deterministic given the seed.

pub mod affinity;
pub mod clusterer;
pub mod eigen;
pub mod error;
pub mod kmeans;
pub mod sparse;
pub mod spectral;

pub use affinity::build_knn_affinity;
pub use clusterer::{ClusterConfig, SpectralClusterer};
pub use error::ConfigError;
pub use kmeans::{kmeans_assign, KMeansConfig};
pub use sparse::CsrMatrix;
pub use spectral::{spectral_embed, SpectralConfig};
