//! Assignment of cycles to operating-program buckets
//!
//! The regime stream carries the active signal-program identifier as sparse
//! change events: a regime observation governs from its own timestamp until
//! the next one. Cycles are bucketed by the stringified program id; cycles
//! that no regime observation covers go to the reserved "unknown" bucket.

use super::types::{Cycle, Observation};
use std::collections::HashMap;

/// Bucket key for cycles no regime observation covers.
pub const UNKNOWN_PROGRAM: &str = "unknown";

/// Result of one segmentation pass.
#[derive(Debug, Default)]
pub struct Segmentation {
    /// Program id (stringified) to the cycles that ran under it.
    pub buckets: HashMap<String, Vec<Cycle>>,
    /// Cycles dropped because they straddle a regime boundary in a way the
    /// data cannot explain (started before the regime, ended inside it).
    pub ambiguous_dropped: u32,
}

/// Partition cycles into program buckets using the regime stream.
///
/// Both inputs must be ascending by time. With no regime observations at
/// all, every cycle lands in [`UNKNOWN_PROGRAM`]. A cycle entirely before
/// the first regime observation is also unknown (no program has been
/// established yet); one that starts before it but ends after it is
/// ambiguous and dropped rather than guessed into a bucket.
pub fn segment_cycles(cycles: &[Cycle], regime: &[Observation]) -> Segmentation {
    let mut segmentation = Segmentation::default();

    if regime.is_empty() {
        if !cycles.is_empty() {
            segmentation
                .buckets
                .insert(UNKNOWN_PROGRAM.to_string(), cycles.to_vec());
        }
        return segmentation;
    }

    let mut idx = 0usize;
    let mut program = regime[0].value.to_string();
    let mut program_start: Option<i64> = Some(regime[0].time);
    let mut program_end: Option<i64> = regime.get(1).map(|o| o.time);

    for cycle in cycles {
        // Advance to the regime governing this cycle's start. After the
        // last observation the program runs open-ended; past it there is
        // nothing left to establish and the bucket falls back to unknown.
        while program_end.map_or(false, |end| cycle.start >= end) {
            idx += 1;
            if idx < regime.len() {
                program = regime[idx].value.to_string();
                program_start = Some(regime[idx].time);
            } else {
                program = UNKNOWN_PROGRAM.to_string();
                program_start = None;
            }
            program_end = regime.get(idx + 1).map(|o| o.time);
        }

        if let Some(start) = program_start {
            if cycle.start < start {
                if cycle.end > start {
                    // Straddles the boundary: the data contradicts itself,
                    // don't guess.
                    segmentation.ambiguous_dropped += 1;
                    log::debug!(
                        "dropping cycle [{}, {}): straddles regime boundary at {}",
                        cycle.start,
                        cycle.end,
                        start
                    );
                    continue;
                }
                segmentation
                    .buckets
                    .entry(UNKNOWN_PROGRAM.to_string())
                    .or_default()
                    .push(cycle.clone());
                continue;
            }
        }

        segmentation
            .buckets
            .entry(program.clone())
            .or_default()
            .push(cycle.clone());
    }

    segmentation
}
