//! Spectral embedding of an affinity graph
//!
//! Maps each graph node to a low-dimensional point whose coordinates are the
//! bottom eigenvectors of the graph Laplacian. Nodes that are strongly
//! connected end up close together, which is what makes plain k-means on the
//! embedded points an effective graph partitioner.

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::eigen::smallest_eigenpairs;
use crate::error::ConfigError;
use crate::sparse::CsrMatrix;

/// Spectral embedding options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Number of embedding dimensions to return
    pub n_components: usize,
    /// Use the degree-normalized Laplacian
    pub normalized: bool,
    /// Discard the trivial leading eigenvector
    ///
    /// On a connected graph the first eigenvector is constant and carries no
    /// clustering information. The clustering path keeps it (matching the
    /// embedding k-means actually runs on); diagnostics may drop it.
    pub drop_first: bool,
    /// Seed for the eigensolver's starting subspace
    pub seed: u64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            n_components: 8,
            normalized: true,
            drop_first: false,
            seed: 1234,
        }
    }
}

/// Embed the nodes of an affinity graph into spectral coordinates
///
/// Returns one row per node with `n_components` columns, ordered by
/// ascending Laplacian eigenvalue. When `normalized`, eigenvector rows are
/// divided by the square-root degrees so the result matches the random-walk
/// embedding. Each eigenvector's sign is canonicalized by forcing its
/// largest-magnitude entry positive, making the embedding reproducible
/// regardless of how the solver was started.
///
/// A graph with more than one connected component is allowed but weakens the
/// spectral guarantees; it is reported as a warning and decomposition
/// proceeds.
///
/// # Errors
/// `ConfigError` if more eigenvectors are requested than the graph has
/// nodes (one extra is needed when `drop_first` is set).
pub fn spectral_embed(
    affinity: &CsrMatrix,
    config: &SpectralConfig,
) -> Result<Array2<f64>, ConfigError> {
    let n = affinity.n();
    let n_solve = config.n_components + usize::from(config.drop_first);
    if n_solve > n || config.n_components == 0 {
        return Err(ConfigError::TooManyComponents {
            requested: n_solve,
            available: n,
        });
    }

    let components = affinity.connected_components();
    if components > 1 {
        warn!(
            "Affinity graph has {} connected components; spectral embedding may not work as expected",
            components
        );
    }

    let (laplacian, dd) = affinity.to_laplacian(config.normalized);
    let (values, mut vectors) = smallest_eigenpairs(&laplacian, n_solve, config.seed);
    debug!(
        "Bottom of Laplacian spectrum: {:?}",
        values.iter().map(|v| (v * 1e4).round() / 1e4).collect::<Vec<_>>()
    );

    // Undo the degree scaling applied to the normalized Laplacian
    if config.normalized {
        for (mut row, scale) in vectors.rows_mut().into_iter().zip(dd.iter()) {
            row.mapv_inplace(|v| v / scale);
        }
    }

    canonicalize_signs(&mut vectors);

    let embedding = if config.drop_first {
        vectors.slice(s![.., 1..n_solve]).to_owned()
    } else {
        vectors.slice(s![.., ..config.n_components]).to_owned()
    };
    Ok(embedding)
}

/// Force the largest-magnitude entry of each column positive
///
/// Eigenvectors are only defined up to sign; fixing the sign by the dominant
/// entry removes the ambiguity so repeated runs produce identical output.
fn canonicalize_signs(vectors: &mut Array2<f64>) {
    for mut column in vectors.columns_mut() {
        let mut dominant = 0.0f64;
        for &v in column.iter() {
            if v.abs() > dominant.abs() {
                dominant = v;
            }
        }
        if dominant < 0.0 {
            column.mapv_inplace(|v| -v);
        }
    }
}
