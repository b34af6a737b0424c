//! RTTM serialization
//!
//! Speaker turns are exchanged in the rich-transcription time-marked format:
//! one whitespace-separated record per line, e.g.
//!
//! ```text
//! SPEAKER ES2011a 1 12.340 3.210 <NA> <NA> ES2011a_0 <NA> <NA>
//! ```
//!
//! Reference files additionally carry `SPKR-INFO` records, which are used
//! only to recover the oracle speaker count.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::DataError;
use crate::types::Turn;

/// Write turns as RTTM records, one line per turn
///
/// Times are written with millisecond precision; the duration field is
/// `end - start`.
pub fn write_rttm<W: Write>(turns: &[Turn], writer: &mut W) -> Result<(), DataError> {
    for turn in turns {
        writeln!(
            writer,
            "SPEAKER {} 1 {:.3} {:.3} <NA> <NA> {} <NA> <NA>",
            turn.recording_id,
            turn.start,
            turn.duration(),
            turn.speaker_id,
        )?;
    }
    Ok(())
}

/// Write turns to an RTTM file, creating or truncating it
pub fn write_rttm_file<P: AsRef<Path>>(turns: &[Turn], path: P) -> Result<(), DataError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_rttm(turns, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read speaker turns from an RTTM file
///
/// Only `SPEAKER` records are parsed; other record types (`SPKR-INFO`,
/// `NON-LEX`, ...) are skipped, as are blank lines.
///
/// # Errors
/// Returns `DataError::MalformedRecord` with the offending line number when a
/// `SPEAKER` record has too few fields or unparseable times.
pub fn read_rttm<P: AsRef<Path>>(path: P) -> Result<Vec<Turn>, DataError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut turns = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields[0] != "SPEAKER" {
            continue;
        }
        if fields.len() < 8 {
            return Err(DataError::MalformedRecord {
                line: idx + 1,
                reason: format!("expected at least 8 fields, got {}", fields.len()),
            });
        }

        let start: f64 = fields[3].parse().map_err(|_| DataError::MalformedRecord {
            line: idx + 1,
            reason: format!("invalid start time `{}`", fields[3]),
        })?;
        let duration: f64 = fields[4].parse().map_err(|_| DataError::MalformedRecord {
            line: idx + 1,
            reason: format!("invalid duration `{}`", fields[4]),
        })?;

        turns.push(Turn::new(fields[1], start, start + duration, fields[7]));
    }

    Ok(turns)
}

/// Count the `SPKR-INFO` records for one recording in a reference RTTM file
///
/// This is the oracle speaker count for the recording: each reference
/// speaker contributes exactly one `SPKR-INFO` line.
pub fn oracle_speaker_count<P: AsRef<Path>>(path: P, recording_id: &str) -> Result<usize, DataError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        if fields.next() == Some("SPKR-INFO") && fields.next() == Some(recording_id) {
            count += 1;
        }
    }
    Ok(count)
}

/// Concatenate per-recording RTTM files into one split-level file
///
/// Each recording's lines are self-contained, so this is a plain ordered
/// byte append.
pub fn concatenate_rttm<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<(), DataError> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    for input in inputs {
        let mut reader = File::open(input.as_ref())?;
        std::io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()?;
    debug!("Concatenated {} RTTM files into {}", inputs.len(), output.display());
    Ok(())
}
