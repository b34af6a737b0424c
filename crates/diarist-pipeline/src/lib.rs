//! diarist-pipeline - batch diarization over precomputed embeddings
//!
//! Reads a split's embedding store, assembles one clustering job per
//! recording, runs the jobs concurrently with per-recording failure
//! isolation, and concatenates the resulting RTTM files.

pub mod config;
pub mod error;
pub mod runner;
pub mod store;

pub use config::{PipelineParams, SpeakerCount};
pub use error::PipelineError;
pub use runner::{diarize_batch, diarize_recording, FailedRecording, RunSummary};
pub use store::{group_by_recording, parse_segment_id, read_embeddings, EmbeddingRecord, RecordingJob};

// Re-export types from diarist-core
pub use diarist_core::{Segment, Turn};
