//! diarist-core - shared types and temporal post-processing
//!
//! This crate holds the data model (segments and speaker turns), the
//! merge/split reconciliation that turns per-segment cluster labels into
//! continuous speaker turns, and RTTM serialization.

pub mod error;
pub mod reconcile;
pub mod rttm;
pub mod types;

pub use error::DataError;
pub use reconcile::{merge_same_speaker, reconcile, split_overlaps};
pub use rttm::{concatenate_rttm, oracle_speaker_count, read_rttm, write_rttm, write_rttm_file};
pub use types::{Segment, Turn};
