//! Rule-based removal of structurally invalid cycles
//!
//! Phase encoding in the result values:
//! 0 = dark, 1 = red, 2 = amber, 3 = green, 4 = red-amber,
//! 5 = amber flashing, 6 = green flashing.
//!
//! Typical cycles:
//! 1. red -> red-amber -> green -> amber -> red
//! 2. red -> green -> red
//!
//! From those, these successor transitions can never occur in valid data:
//! red -> amber, amber -> green, amber -> red-amber, green -> red-amber,
//! red-amber -> red, red-amber -> amber.
//!
//! Missed observations show up as impossibly long holds: amber holds at
//! most 6 consecutive seconds, red-amber at most 2.

use super::types::Cycle;
use serde::Serialize;

/// Forbidden successor for the transition-tracked phases (1 through 4).
fn is_forbidden_transition(from: i8, to: i8) -> bool {
    matches!((from, to), (1, 2) | (2, 3) | (2, 4) | (3, 4) | (4, 1) | (4, 2))
}

/// Phases outside 1..=4 reset the tracked state: no check applies to or
/// from them.
fn tracks_transitions(value: i8) -> bool {
    (1..=4).contains(&value)
}

/// Longest permitted consecutive run for duration-capped phases.
fn max_run_length(value: i8) -> Option<usize> {
    match value {
        2 => Some(6),
        4 => Some(2),
        _ => None,
    }
}

/// Removal counts for one cleanup pass. A cycle can match several reasons
/// but is removed (and counted in `removed`) at most once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupCounts {
    pub processed: u32,
    pub removed: u32,
    pub length_outliers: u32,
    pub illegal_transitions: u32,
    pub duration_cap_violations: u32,
}

fn median(values: &mut Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn has_wrong_length(cycle: &Cycle, median_length: f64) -> bool {
    let len = cycle.results.len() as f64;
    len > median_length * 1.5 || len < median_length * 0.5
}

fn has_illegal_transition(cycle: &Cycle) -> bool {
    let mut current: Option<i8> = None;
    for &value in &cycle.results {
        if let Some(from) = current {
            if is_forbidden_transition(from, value) {
                return true;
            }
        }
        current = tracks_transitions(value).then_some(value);
    }
    false
}

fn has_duration_cap_violation(cycle: &Cycle) -> bool {
    let mut run_value: Option<i8> = None;
    let mut run_length = 0usize;
    for &value in &cycle.results {
        if run_value == Some(value) {
            run_length += 1;
        } else {
            run_value = Some(value);
            run_length = 1;
        }
        if let Some(cap) = max_run_length(value) {
            if run_length > cap {
                return true;
            }
        }
    }
    false
}

/// Remove structurally invalid cycles and report per-reason counts.
///
/// Every cycle is evaluated against all three rules so the counts stay
/// meaningful even when a cycle fails more than one of them.
pub fn clean_cycles(cycles: Vec<Cycle>) -> (Vec<Cycle>, CleanupCounts) {
    let mut counts = CleanupCounts::default();
    if cycles.is_empty() {
        return (cycles, counts);
    }

    let mut lengths: Vec<f64> = cycles.iter().map(|c| c.results.len() as f64).collect();
    let median_length = median(&mut lengths);

    let mut cleaned = Vec::with_capacity(cycles.len());
    for cycle in cycles {
        counts.processed += 1;

        let wrong_length = has_wrong_length(&cycle, median_length);
        let illegal_transition = has_illegal_transition(&cycle);
        let cap_violation = has_duration_cap_violation(&cycle);

        if wrong_length {
            counts.length_outliers += 1;
        }
        if illegal_transition {
            counts.illegal_transitions += 1;
        }
        if cap_violation {
            counts.duration_cap_violations += 1;
        }

        if wrong_length || illegal_transition || cap_violation {
            counts.removed += 1;
            log::debug!(
                "removing cycle [{}, {}): wrong_length={} illegal_transition={} cap_violation={}",
                cycle.start,
                cycle.end,
                wrong_length,
                illegal_transition,
                cap_violation
            );
        } else {
            cleaned.push(cycle);
        }
    }

    (cleaned, counts)
}
