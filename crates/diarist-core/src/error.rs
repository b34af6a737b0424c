//! Data error types

use thiserror::Error;

/// Errors raised by malformed or inconsistent diarization data
#[derive(Error, Debug)]
pub enum DataError {
    /// A turn list passed to per-recording processing referenced a second recording
    #[error("expected entries for recording `{expected}`, found `{found}`")]
    MixedRecordings {
        /// Recording the call was scoped to
        expected: String,
        /// Offending recording id
        found: String,
    },

    /// Zero-duration or inverted time interval
    #[error("invalid interval in recording `{recording_id}`: start={start}, end={end}")]
    InvalidInterval {
        /// Recording the interval belongs to
        recording_id: String,
        /// Interval start in seconds
        start: f64,
        /// Interval end in seconds
        end: f64,
    },

    /// Unparseable RTTM record
    #[error("malformed RTTM record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the file
        line: usize,
        /// What failed to parse
        reason: String,
    },

    /// Segment identifier that does not end in `<start>_<end>`
    #[error("malformed segment id `{0}`")]
    MalformedSegmentId(String),

    /// Embedding store record that cannot be used
    #[error("invalid embedding record for segment `{segment_id}`: {reason}")]
    InvalidEmbedding {
        /// Segment the record belongs to
        segment_id: String,
        /// What is wrong with it
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
