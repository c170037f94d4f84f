//! Cycle reconstruction from the state and tick streams
//!
//! Tick observations define consecutive intervals `[tick[i], tick[i+1])`.
//! A state observation holds from its own timestamp until the next state
//! observation. A simulated cursor walks second by second from the earliest
//! observation; whenever it sits inside a tick interval with a known
//! governing state, that state is appended to the open cycle once per
//! second. The cursor actually advances in batches (up to the next state
//! change or the interval end, whichever comes first), which produces the
//! same output as a literal one-second replay.
//!
//! A cycle is opened only when the cursor lands exactly on an interval
//! start while the governing state is known. An interval that closes
//! without an open cycle is counted as skipped, never emitted partially.
//! The dangling interval after the last tick is left for the next window.

use super::types::{Cycle, Observation};
use crate::error::EngineError;

/// Output of one reconstruction pass over a window.
#[derive(Debug, Default)]
pub struct Reconstruction {
    pub cycles: Vec<Cycle>,
    pub skipped_cycles: u32,
    /// The window had no state observations at all.
    pub state_missing: bool,
    /// The window had no tick observations at all.
    pub tick_missing: bool,
}

/// Reconstruct cycles from one window of state and tick observations.
///
/// Both slices must be strictly ascending by time. `carried_state` is the last
/// governing state of the previous window; it is consulted only when the
/// first state observation of this window lies strictly after the first
/// tick (the state was already in effect when the window began).
///
/// If either stream is empty the window is unprocessable: the matching
/// missing flag is set and no cycles are produced, so the caller keeps
/// every observation for the next window. A state stream with exactly one
/// observation cannot happen with healthy data and is reported as a data
/// inconsistency rather than silently tolerated.
pub fn reconstruct_cycles(
    state: &[Observation],
    ticks: &[Observation],
    carried_state: Option<i8>,
) -> Result<Reconstruction, EngineError> {
    if state.is_empty() || ticks.is_empty() {
        return Ok(Reconstruction {
            state_missing: state.is_empty(),
            tick_missing: ticks.is_empty(),
            ..Default::default()
        });
    }

    if state.len() == 1 {
        return Err(EngineError::DataInconsistency(format!(
            "only one state observation in a window ({:?}), with {} tick observations; \
             not enough to reconstruct cycles",
            state[0],
            ticks.len()
        )));
    }

    let first_state = state[0].time;
    let first_tick = ticks[0].time;
    let last_tick = ticks[ticks.len() - 1].time;

    // Governing-state cursor. `state_idx` is None while the carried state
    // from the previous window is still in effect.
    let mut state_idx: Option<usize>;
    let mut governing: Option<i8>;
    let mut upcoming: Option<i64>;
    if first_state > first_tick {
        state_idx = None;
        governing = carried_state;
        upcoming = Some(first_state);
    } else {
        state_idx = Some(0);
        governing = Some(state[0].value);
        upcoming = state.get(1).map(|o| o.time);
    }

    // Start at the earliest observation: if the state came first we need it
    // to know the value once the first tick arrives; if the tick came first
    // we cannot know the value any earlier anyway.
    let mut cursor = first_state.min(first_tick);

    let mut tick_idx = 0usize;
    let mut interval: Option<(i64, i64)> = None;
    let mut open: Option<Cycle> = None;
    let mut cycles: Vec<Cycle> = Vec::new();
    let mut skipped_cycles = 0u32;

    while cursor <= last_tick {
        if interval.is_none() {
            if tick_idx + 1 >= ticks.len() {
                break;
            }
            interval = Some((ticks[tick_idx].time, ticks[tick_idx + 1].time));
        }
        let (mut ivl_start, mut ivl_end) = match interval {
            Some(bounds) => bounds,
            None => break,
        };

        // Interval rollover. An interval that closes with nothing recorded
        // had no governing state at its start: count it as skipped.
        if cursor >= ivl_end {
            match open.take() {
                Some(cycle) => cycles.push(cycle),
                None => skipped_cycles += 1,
            }
            tick_idx += 1;
            if tick_idx + 1 >= ticks.len() {
                break;
            }
            ivl_start = ticks[tick_idx].time;
            ivl_end = ticks[tick_idx + 1].time;
            interval = Some((ivl_start, ivl_end));
        }

        // The cursor reached the next state observation: it takes over.
        while upcoming.map_or(false, |u| cursor >= u) {
            let next = state_idx.map_or(0, |i| i + 1);
            state_idx = Some(next);
            governing = Some(state[next].value);
            upcoming = state.get(next + 1).map(|o| o.time);
        }

        // Open a cycle only at the exact interval start and only when the
        // governing state is known; otherwise the interval runs out and is
        // skipped above.
        if open.is_none() && cursor == ivl_start && governing.is_some() {
            open = Some(Cycle {
                start: ivl_start,
                end: ivl_end,
                results: Vec::new(),
            });
        }

        match (open.as_mut(), governing) {
            (Some(cycle), Some(value)) if cursor >= ivl_start => {
                // Fill with the governing value until the next state change
                // or the interval end, whichever comes first.
                let to_upcoming = upcoming.map_or(i64::MAX, |u| u - cursor);
                let to_end = ivl_end - cursor;
                let step = to_upcoming.min(to_end);
                cycle
                    .results
                    .extend(std::iter::repeat(value).take(step as usize));
                cursor += step;
            }
            _ => cursor += 1,
        }
    }

    Ok(Reconstruction {
        cycles,
        skipped_cycles,
        state_missing: false,
        tick_missing: false,
    })
}
