//! Embedding store reading and job assembly
//!
//! The embedding extractor hands over one record per segment, keyed by a
//! segment identifier of the form `<recording>_<start>_<end>` (pipe
//! delimiters are tolerated). The identifier is parsed exactly once, here;
//! everything downstream works with an explicit recording id and plain
//! start/end times. The persisted layout is a JSON-lines file, one record
//! per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use diarist_core::{DataError, Segment};

/// One persisted embedding store record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Segment identifier, `<recording>_<start>_<end>`
    pub segment_id: String,
    /// Fixed-length embedding vector
    pub embedding: Vec<f32>,
}

/// All segments of one recording, ready for clustering
#[derive(Debug, Clone)]
pub struct RecordingJob {
    /// Recording these segments belong to
    pub recording_id: String,
    /// Segments sorted by start time
    pub segments: Vec<Segment>,
}

impl RecordingJob {
    /// Stack the segment embeddings into one row-per-segment matrix
    ///
    /// # Errors
    /// `DataError` if embedding dimensions are inconsistent within the
    /// recording.
    pub fn embedding_matrix(&self) -> Result<Array2<f32>, DataError> {
        let n = self.segments.len();
        let dim = self.segments.first().map_or(0, |s| s.embedding.len());

        let mut matrix = Array2::zeros((n, dim));
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.embedding.len() != dim {
                return Err(DataError::InvalidEmbedding {
                    segment_id: format!("{}_{}_{}", self.recording_id, segment.start, segment.end),
                    reason: format!(
                        "dimension {} differs from the recording's {}",
                        segment.embedding.len(),
                        dim
                    ),
                });
            }
            for (j, &v) in segment.embedding.iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }
        Ok(matrix)
    }
}

/// Split a segment identifier into recording id, start and end
///
/// The last two delimited fields are the start and end times; everything
/// before them is the recording id (which may itself contain delimiters).
pub fn parse_segment_id(id: &str) -> Result<(String, f64, f64), DataError> {
    let delimiter = if id.contains('|') { '|' } else { '_' };
    let mut fields = id.rsplitn(3, delimiter);

    let (Some(end), Some(start), Some(recording_id)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(DataError::MalformedSegmentId(id.to_string()));
    };
    if recording_id.is_empty() {
        return Err(DataError::MalformedSegmentId(id.to_string()));
    }

    let start: f64 = start
        .parse()
        .map_err(|_| DataError::MalformedSegmentId(id.to_string()))?;
    let end: f64 = end
        .parse()
        .map_err(|_| DataError::MalformedSegmentId(id.to_string()))?;

    Ok((recording_id.to_string(), start, end))
}

/// Read an embedding store file into segments
///
/// # Errors
/// `DataError` on unreadable lines, malformed segment ids, empty embeddings
/// or non-finite values.
pub fn read_embeddings<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>, DataError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut segments = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: EmbeddingRecord =
            serde_json::from_str(&line).map_err(|e| DataError::MalformedRecord {
                line: idx + 1,
                reason: e.to_string(),
            })?;

        if record.embedding.is_empty() {
            return Err(DataError::InvalidEmbedding {
                segment_id: record.segment_id,
                reason: "empty embedding".to_string(),
            });
        }
        if record.embedding.iter().any(|v| !v.is_finite()) {
            return Err(DataError::InvalidEmbedding {
                segment_id: record.segment_id,
                reason: "non-finite value".to_string(),
            });
        }

        let (recording_id, start, end) = parse_segment_id(&record.segment_id)?;
        segments.push(Segment {
            recording_id,
            start,
            end,
            embedding: record.embedding,
        });
    }

    info!(
        "Read {} segment embeddings from {}",
        segments.len(),
        path.as_ref().display()
    );
    Ok(segments)
}

/// Group segments into per-recording jobs
///
/// Jobs come back sorted by recording id, segments within a job by start
/// time (ties keep input order).
pub fn group_by_recording(segments: Vec<Segment>) -> Vec<RecordingJob> {
    let mut jobs: Vec<RecordingJob> = Vec::new();
    for segment in segments {
        match jobs.iter_mut().find(|j| j.recording_id == segment.recording_id) {
            Some(job) => job.segments.push(segment),
            None => jobs.push(RecordingJob {
                recording_id: segment.recording_id.clone(),
                segments: vec![segment],
            }),
        }
    }

    jobs.sort_by(|a, b| a.recording_id.cmp(&b.recording_id));
    for job in &mut jobs {
        job.segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        debug!("Recording {}: {} segments", job.recording_id, job.segments.len());
    }
    jobs
}
