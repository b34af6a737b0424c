//! Pipeline error types

use thiserror::Error;

use diarist_clustering::ConfigError;
use diarist_core::DataError;

/// Errors from job assembly and batch processing
///
/// Configuration and data errors abort only the recording they concern; the
/// batch runner records them per recording id and keeps going.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid clustering parameters for a recording
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed or inconsistent input data
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// Reference RTTM carries no `SPKR-INFO` records for a recording
    #[error("no oracle speaker count for recording `{0}` in reference RTTM")]
    MissingOracleCount(String),

    /// Parameter file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
