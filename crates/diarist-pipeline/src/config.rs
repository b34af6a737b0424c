//! Pipeline parameters
//!
//! One JSON parameter file drives a batch run; individual top-level keys can
//! be overridden on the command line as `key=value` pairs, with values given
//! as JSON (bare words are taken as strings).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use diarist_clustering::ClusterConfig;

use crate::error::PipelineError;

/// Where the cluster count per recording comes from
///
/// Both variants resolve to a plain integer before clustering; the pipeline
/// treats an oracle count and an externally tuned one identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerCount {
    /// One fixed count for every recording (externally supplied or swept)
    Fixed {
        /// Cluster count
        count: usize,
    },
    /// Count the `SPKR-INFO` records per recording in a reference RTTM
    Oracle {
        /// Reference RTTM file with `SPKR-INFO` lines
        reference_rttm: PathBuf,
    },
}

/// Parameters for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineParams {
    /// JSON-lines embedding store for the split
    pub embeddings_file: PathBuf,
    /// Directory for per-recording and concatenated RTTM output
    pub output_dir: PathBuf,
    /// Cluster count source
    pub speakers: SpeakerCount,

    /// Nearest neighbors per node in the affinity graph
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
    /// Count each point as its own neighbor
    #[serde(default)]
    pub include_self: bool,
    /// k-means restarts
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    /// Seed for eigensolver and k-means
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_neighbors() -> usize {
    10
}

fn default_n_init() -> usize {
    10
}

fn default_seed() -> u64 {
    1234
}

impl PipelineParams {
    /// Load parameters from a JSON file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Self::load_with_overrides(path, &[])
    }

    /// Load parameters and apply `key=value` overrides to top-level keys
    ///
    /// Override values are parsed as JSON first (`neighbors=20`,
    /// `speakers={"fixed":{"count":4}}`); anything that does not parse is
    /// taken as a plain string.
    pub fn load_with_overrides(path: &Path, overrides: &[String]) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        let mut value: serde_json::Value = serde_json::from_str(&content)?;

        for entry in overrides {
            let (key, raw) = entry.split_once('=').ok_or_else(|| {
                PipelineError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("override `{entry}` is not of the form key=value"),
                ))
            })?;
            let parsed = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            value
                .as_object_mut()
                .ok_or_else(|| {
                    PipelineError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "parameter file root is not a JSON object",
                    ))
                })?
                .insert(key.to_string(), parsed);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Clustering configuration derived from these parameters
    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            neighbors: self.neighbors,
            include_self: self.include_self,
            n_init: self.n_init,
            seed: self.seed,
        }
    }
}
