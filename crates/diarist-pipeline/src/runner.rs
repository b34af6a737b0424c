//! Per-recording diarization and batch orchestration
//!
//! Recordings are independent: each owns its affinity graph, spectral
//! points and labels, so the batch runner fans them out to blocking worker
//! tasks with no shared state. A failed recording is reported with its id
//! and never takes the batch down; the only single-threaded step is the
//! final concatenation of per-recording RTTM files.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use diarist_clustering::{ClusterConfig, SpectralClusterer};
use diarist_core::{concatenate_rttm, oracle_speaker_count, reconcile, write_rttm_file, Turn};

use crate::config::{PipelineParams, SpeakerCount};
use crate::error::PipelineError;
use crate::store::RecordingJob;

/// One recording that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRecording {
    /// Recording id
    pub recording_id: String,
    /// Rendered error
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Recordings diarized successfully, in output order
    pub completed: Vec<String>,
    /// Recordings that failed, with their errors
    pub failed: Vec<FailedRecording>,
    /// Concatenated RTTM for the whole batch
    pub output_rttm: PathBuf,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock finish
    pub finished_at: DateTime<Utc>,
}

/// Diarize one recording into reconciled speaker turns
///
/// Runs the full per-recording pipeline: spectral clustering of the
/// embeddings, speaker ids of the form `<recording>_<label>`, then
/// merge/split reconciliation into ordered non-overlapping turns.
pub fn diarize_recording(
    job: &RecordingJob,
    k: usize,
    config: &ClusterConfig,
) -> Result<Vec<Turn>, PipelineError> {
    let embeddings = job.embedding_matrix()?;
    let clusterer = SpectralClusterer::new(config.clone());
    let labels = clusterer.cluster(embeddings.view(), k)?;

    let entries: Vec<Turn> = job
        .segments
        .iter()
        .zip(&labels)
        .map(|(segment, &label)| {
            Turn::new(
                &job.recording_id,
                segment.start,
                segment.end,
                format!("{}_{}", job.recording_id, label),
            )
        })
        .collect();

    let turns = reconcile(&job.recording_id, &entries)?;
    info!("Completed diarizing {}", job.recording_id);
    Ok(turns)
}

/// Resolve the cluster count for one recording
fn resolve_speaker_count(
    source: &SpeakerCount,
    recording_id: &str,
) -> Result<usize, PipelineError> {
    match source {
        SpeakerCount::Fixed { count } => Ok(*count),
        SpeakerCount::Oracle { reference_rttm } => {
            let count = oracle_speaker_count(reference_rttm, recording_id)?;
            if count == 0 {
                return Err(PipelineError::MissingOracleCount(recording_id.to_string()));
            }
            Ok(count)
        }
    }
}

/// Diarize a batch of recordings concurrently
///
/// Writes one RTTM file per completed recording into the output directory,
/// concatenates them (in recording-id order) into `sys_output.rttm`, and
/// stores the run summary as `run_summary.json` alongside.
///
/// # Errors
/// Only batch-level failures (output directory, summary, concatenation)
/// surface as `Err`; per-recording failures land in the summary.
pub async fn diarize_batch(
    jobs: Vec<RecordingJob>,
    params: &PipelineParams,
) -> Result<RunSummary, PipelineError> {
    let started_at = Utc::now();
    std::fs::create_dir_all(&params.output_dir)?;

    let total = jobs.len();
    info!("Diarizing {} recordings", total);

    let mut handles = Vec::with_capacity(total);
    for (index, job) in jobs.into_iter().enumerate() {
        let recording_id = job.recording_id.clone();
        let config = params.cluster_config();
        let speakers = params.speakers.clone();
        let out_path = params.output_dir.join(format!("{recording_id}.rttm"));

        handles.push(tokio::task::spawn_blocking(move || {
            info!("[{}/{}] Diarizing {}", index + 1, total, recording_id);
            let result = resolve_speaker_count(&speakers, &recording_id)
                .and_then(|k| diarize_recording(&job, k, &config))
                .and_then(|turns| {
                    write_rttm_file(&turns, &out_path)?;
                    Ok(out_path)
                });
            (recording_id, result)
        }));
    }

    let mut completed = Vec::new();
    let mut outputs = Vec::new();
    let mut failed = Vec::new();
    for joined in join_all(handles).await {
        match joined {
            Ok((recording_id, Ok(path))) => {
                completed.push(recording_id);
                outputs.push(path);
            }
            Ok((recording_id, Err(e))) => {
                error!("Recording {} failed: {}", recording_id, e);
                failed.push(FailedRecording {
                    recording_id,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                error!("Worker task aborted: {}", e);
                failed.push(FailedRecording {
                    recording_id: "<unknown>".to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    // Ordered append; the workers were spawned in recording-id order but may
    // finish in any order
    let mut ordered: Vec<(String, PathBuf)> =
        completed.iter().cloned().zip(outputs).collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0));
    completed = ordered.iter().map(|(id, _)| id.clone()).collect();
    let ordered_paths: Vec<PathBuf> = ordered.into_iter().map(|(_, p)| p).collect();

    let output_rttm = params.output_dir.join("sys_output.rttm");
    concatenate_rttm(&ordered_paths, &output_rttm)?;

    let summary = RunSummary {
        completed,
        failed,
        output_rttm,
        started_at,
        finished_at: Utc::now(),
    };

    let summary_path = params.output_dir.join("run_summary.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    info!(
        "Batch finished: {} completed, {} failed, output {}",
        summary.completed.len(),
        summary.failed.len(),
        summary.output_rttm.display()
    );
    Ok(summary)
}
