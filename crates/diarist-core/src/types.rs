//! Shared diarization types

use serde::{Deserialize, Serialize};

/// One speech segment of a recording with its speaker embedding
///
/// Segment boundaries come from oracle voice activity; the embedding is
/// produced by an external model and treated as opaque here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Recording this segment belongs to
    pub recording_id: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Fixed-length speaker embedding
    pub embedding: Vec<f32>,
}

impl Segment {
    /// Get the duration of this segment
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One continuous speaker turn
///
/// Before reconciliation a `Turn` is a raw labeled segment; after
/// reconciliation turns within a recording are time-ordered and
/// non-overlapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Recording this turn belongs to
    pub recording_id: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Speaker identifier (e.g. "ES2011a_0")
    pub speaker_id: String,
}

impl Turn {
    /// Create a new turn
    pub fn new(recording_id: impl Into<String>, start: f64, end: f64, speaker_id: impl Into<String>) -> Self {
        Self {
            recording_id: recording_id.into(),
            start,
            end,
            speaker_id: speaker_id.into(),
        }
    }

    /// Get the duration of this turn
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_duration() {
        let turn = Turn::new("rec1", 1.0, 3.5, "rec1_0");
        assert!((turn.duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_segment_serialization() {
        let segment = Segment {
            recording_id: "rec1".to_string(),
            start: 0.5,
            end: 2.0,
            embedding: vec![0.1, 0.2, 0.3],
        };
        let json = serde_json::to_string(&segment).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.recording_id, "rec1");
        assert_eq!(back.embedding.len(), 3);
    }
}
