//! Turn reconciliation
//!
//! Converts raw per-segment speaker labels into a minimal list of continuous
//! speaker turns in two passes: merge temporally adjacent segments of the
//! same speaker, then split the remaining cross-speaker overlaps at their
//! midpoint so no time interval is counted twice.

use crate::error::DataError;
use crate::types::Turn;

/// Reconcile labeled segments of one recording into ordered speaker turns
///
/// Entries may arrive unordered and may overlap. The output is time-ordered
/// and pairwise non-overlapping, and covers exactly the union of the input
/// intervals.
///
/// # Errors
/// Returns `DataError` if any entry references a recording other than
/// `recording_id`, or has `end <= start`.
pub fn reconcile(recording_id: &str, entries: &[Turn]) -> Result<Vec<Turn>, DataError> {
    for entry in entries {
        if entry.recording_id != recording_id {
            return Err(DataError::MixedRecordings {
                expected: recording_id.to_string(),
                found: entry.recording_id.clone(),
            });
        }
        if entry.end <= entry.start {
            return Err(DataError::InvalidInterval {
                recording_id: entry.recording_id.clone(),
                start: entry.start,
                end: entry.end,
            });
        }
    }

    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut sorted = entries.to_vec();
    // Stable sort: entries starting at the same time keep their input order
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    Ok(split_overlaps(merge_same_speaker(sorted)))
}

/// Merge consecutive same-speaker turns that touch or overlap
///
/// Expects turns sorted by start time. Two consecutive turns merge when they
/// share a speaker and `next.start <= current.end`; any positive gap keeps
/// them separate. Applying this to already-merged output is a no-op.
pub fn merge_same_speaker(turns: Vec<Turn>) -> Vec<Turn> {
    let mut iter = turns.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if next.speaker_id == current.speaker_id && next.start <= current.end {
            current.end = current.end.max(next.end);
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

/// Split overlaps between consecutive different-speaker turns at the midpoint
///
/// Expects sorted, same-speaker-merged turns. For each consecutive pair with
/// `next.start < current.end` the contested interval is halved: the earlier
/// turn ends at the midpoint and the later one starts there. Non-overlapping
/// neighbors are left untouched.
pub fn split_overlaps(mut turns: Vec<Turn>) -> Vec<Turn> {
    for i in 1..turns.len() {
        let prev_end = turns[i - 1].end;
        let next_start = turns[i].start;
        if next_start < prev_end {
            let mid = (next_start + prev_end) / 2.0;
            turns[i - 1].end = mid;
            turns[i].start = mid;
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn turn(start: f64, end: f64, speaker: &str) -> Turn {
        Turn::new("rec1", start, end, speaker)
    }

    /// Total length of the union of intervals, for coverage checks
    fn union_length(turns: &[Turn]) -> f64 {
        let mut intervals: Vec<(f64, f64)> = turns.iter().map(|t| (t.start, t.end)).collect();
        intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut total = 0.0;
        let mut covered_to = f64::NEG_INFINITY;
        for (start, end) in intervals {
            if end > covered_to {
                total += end - start.max(covered_to);
                covered_to = end;
            }
        }
        total
    }

    #[test]
    fn test_midpoint_split_exactness() {
        let entries = vec![turn(0.0, 2.0, "spkrA"), turn(1.0, 3.0, "spkrB")];
        let turns = reconcile("rec1", &entries).unwrap();

        assert_eq!(turns.len(), 2);
        assert!((turns[0].end - 1.5).abs() < 1e-9);
        assert!((turns[1].start - 1.5).abs() < 1e-9);
        assert_eq!(turns[0].speaker_id, "spkrA");
        assert_eq!(turns[1].speaker_id, "spkrB");
    }

    #[test]
    fn test_adjacent_same_speaker_merge() {
        let entries = vec![
            turn(0.0, 1.0, "spkrA"),
            turn(1.0, 2.0, "spkrA"),
            turn(2.0, 3.0, "spkrB"),
        ];
        let turns = reconcile("rec1", &entries).unwrap();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], turn(0.0, 2.0, "spkrA"));
        assert_eq!(turns[1], turn(2.0, 3.0, "spkrB"));
    }

    #[test]
    fn test_gap_prevents_merge() {
        let entries = vec![turn(0.0, 1.0, "spkrA"), turn(1.5, 2.0, "spkrA")];
        let turns = reconcile("rec1", &entries).unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let entries = vec![
            turn(0.0, 1.2, "spkrA"),
            turn(1.0, 2.0, "spkrA"),
            turn(2.5, 3.0, "spkrB"),
            turn(3.0, 4.0, "spkrB"),
        ];
        let merged = merge_same_speaker(entries);
        let remerged = merge_same_speaker(merged.clone());
        assert_eq!(merged, remerged);
    }

    #[test]
    fn test_unsorted_input() {
        let entries = vec![turn(2.0, 3.0, "spkrB"), turn(0.0, 2.0, "spkrA")];
        let turns = reconcile("rec1", &entries).unwrap();
        assert_eq!(turns[0].speaker_id, "spkrA");
        assert_eq!(turns[1].speaker_id, "spkrB");
    }

    #[test]
    fn test_empty_input() {
        let turns = reconcile("rec1", &[]).unwrap();
        assert!(turns.is_empty());
    }

    #[test]
    fn test_mixed_recordings_rejected() {
        let entries = vec![turn(0.0, 1.0, "spkrA"), Turn::new("rec2", 1.0, 2.0, "spkrA")];
        let err = reconcile("rec1", &entries).unwrap_err();
        assert!(matches!(err, DataError::MixedRecordings { .. }));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let entries = vec![turn(2.0, 1.0, "spkrA")];
        let err = reconcile("rec1", &entries).unwrap_err();
        assert!(matches!(err, DataError::InvalidInterval { .. }));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let entries = vec![turn(1.0, 1.0, "spkrA")];
        assert!(reconcile("rec1", &entries).is_err());
    }

    #[test]
    fn test_coverage_conserved_with_gap() {
        let entries = vec![
            turn(0.0, 1.0, "spkrA"),
            turn(0.8, 2.0, "spkrB"),
            // genuine silence gap here
            turn(5.0, 6.0, "spkrA"),
        ];
        let before = union_length(&entries);
        let turns = reconcile("rec1", &entries).unwrap();
        let after = union_length(&turns);
        assert!((before - after).abs() < 1e-9);
    }

    proptest! {
        // Entries modeled on what the pipeline actually produces: fixed-length
        // sliding windows with varying shift, so a window never fully contains
        // a later one.
        #[test]
        fn prop_output_is_ordered_and_non_overlapping(
            steps in prop::collection::vec((1u32..40, 0u8..4), 1..40)
        ) {
            const WINDOW: f64 = 3.0;
            let mut start = 0.0;
            let mut entries = Vec::new();
            for &(step, spk) in &steps {
                entries.push(turn(start, start + WINDOW, &format!("spkr{spk}")));
                start += f64::from(step) / 10.0;
            }

            let turns = reconcile("rec1", &entries).unwrap();

            for pair in turns.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start + 1e-9);
            }
            for t in &turns {
                prop_assert!(t.end >= t.start);
            }
            prop_assert!((union_length(&entries) - union_length(&turns)).abs() < 1e-6);
        }
    }
}
