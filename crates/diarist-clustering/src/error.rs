//! Clustering configuration errors

use thiserror::Error;

/// Invalid clustering parameters for the data at hand
///
/// A configuration error aborts the recording it concerns; it never aborts a
/// whole batch.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neighbor count below 1
    #[error("neighbor count must be at least 1, got {0}")]
    InvalidNeighborCount(usize),

    /// Clustering is undefined for fewer than two segments
    #[error("clustering requires at least 2 segments, got {0}")]
    TooFewSegments(usize),

    /// More clusters requested than points available
    #[error("requested {requested} clusters for {available} points")]
    TooManyClusters {
        /// Requested cluster count
        requested: usize,
        /// Number of points
        available: usize,
    },

    /// More spectral components requested than points available
    #[error("requested {requested} spectral components for {available} points")]
    TooManyComponents {
        /// Requested component count (including a dropped leading one)
        requested: usize,
        /// Number of points
        available: usize,
    },

    /// Cluster count of zero
    #[error("cluster count must be at least 1")]
    ZeroClusters,
}
