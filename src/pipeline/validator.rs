//! Probabilistic consistency check of reconstructed cycles
//!
//! Opt-in and expensive: every check scans the raw buffers. The validator
//! exists to catch reconstruction bugs during development and regression
//! runs, not to tolerate bad data. Any failed assertion means the engine
//! produced output that its own inputs cannot back, so it aborts with the
//! complete picture (cycle bounds, results, transitions, both raw buffers)
//! instead of degrading into a counter.

use super::types::{Cycle, Observation};
use crate::error::EngineError;
use rand::Rng;

/// How many successful spot checks one validation pass performs.
const SPOT_CHECKS: usize = 50;

/// The internal transitions of a cycle: each position where the value
/// differs from its predecessor, as (value, absolute second).
fn internal_transitions(cycle: &Cycle) -> Vec<(i8, i64)> {
    let mut transitions = Vec::new();
    for (idx, pair) in cycle.results.windows(2).enumerate() {
        if pair[0] != pair[1] {
            transitions.push((pair[1], cycle.start + idx as i64 + 1));
        }
    }
    transitions
}

/// Spot-check reconstructed cycles against the raw window buffers.
///
/// First verifies `end - start == results.len()` for every cycle, then runs
/// up to [`SPOT_CHECKS`] random probes: pick a cycle, pick one of its
/// internal transitions, and require exactly one raw state observation at
/// that second with that value plus exactly one raw tick observation at the
/// cycle's start. Cycles without internal transitions are skipped without
/// using up a probe. Must run before the buffers are trimmed to residue.
pub fn validate_cycles<R: Rng>(
    cycles: &[Cycle],
    state: &[Observation],
    ticks: &[Observation],
    rng: &mut R,
) -> Result<(), EngineError> {
    if cycles.is_empty() {
        return Ok(());
    }

    for cycle in cycles {
        if cycle.duration() != cycle.results.len() as i64 {
            return Err(EngineError::DataInconsistency(format!(
                "cycle [{}, {}) spans {} seconds but holds {} results",
                cycle.start,
                cycle.end,
                cycle.duration(),
                cycle.results.len()
            )));
        }
    }

    // A batch where no cycle ever changes state has nothing to probe.
    if !cycles.iter().any(|c| !internal_transitions(c).is_empty()) {
        log::debug!("validation: no internal transitions in {} cycles, nothing to spot-check", cycles.len());
        return Ok(());
    }

    let mut checked = 0usize;
    while checked < SPOT_CHECKS {
        let cycle = &cycles[rng.gen_range(0..cycles.len())];
        let transitions = internal_transitions(cycle);
        if transitions.is_empty() {
            continue;
        }
        let (value, second) = transitions[rng.gen_range(0..transitions.len())];

        let matching_state = state
            .iter()
            .filter(|o| o.time == second && o.value == value)
            .count();
        if matching_state != 1 {
            return Err(EngineError::DataInconsistency(diagnostic(
                &format!(
                    "{} raw state observations back the transition to {} at second {}",
                    matching_state, value, second
                ),
                cycle,
                &transitions,
                state,
                ticks,
            )));
        }

        let matching_ticks = ticks.iter().filter(|o| o.time == cycle.start).count();
        if matching_ticks != 1 {
            return Err(EngineError::DataInconsistency(diagnostic(
                &format!(
                    "{} raw tick observations back the cycle start at second {}",
                    matching_ticks, cycle.start
                ),
                cycle,
                &transitions,
                state,
                ticks,
            )));
        }

        checked += 1;
    }

    log::debug!("validation passed: {} spot checks over {} cycles", checked, cycles.len());
    Ok(())
}

fn diagnostic(
    finding: &str,
    cycle: &Cycle,
    transitions: &[(i8, i64)],
    state: &[Observation],
    ticks: &[Observation],
) -> String {
    format!(
        "{}\n  cycle: [{}, {})\n  results: {:?}\n  transitions: {:?}\n  \
         raw state observations: {:?}\n  raw tick observations: {:?}",
        finding, cycle.start, cycle.end, cycle.results, transitions, state, ticks
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reconstructor::reconstruct_cycles;
    use crate::pipeline::types::phase::{GREEN, RED};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn obs(time: i64, value: i8) -> Observation {
        Observation::new(time, value)
    }

    fn consistent_window() -> (Vec<Observation>, Vec<Observation>) {
        let mut state = Vec::new();
        let mut ticks = Vec::new();
        for i in 0..10i64 {
            let start = i * 60;
            state.push(obs(start, RED));
            state.push(obs(start + 30, GREEN));
            ticks.push(obs(start, 0));
        }
        ticks.push(obs(600, 0));
        (state, ticks)
    }

    #[test]
    fn test_reconstructed_cycles_pass_validation() {
        let (state, ticks) = consistent_window();
        let rec = reconstruct_cycles(&state, &ticks, None).unwrap();
        assert_eq!(rec.cycles.len(), 10);

        let mut rng = StdRng::seed_from_u64(7);
        validate_cycles(&rec.cycles, &state, &ticks, &mut rng).unwrap();
    }

    #[test]
    fn test_tampered_result_fails_validation() {
        let (state, ticks) = consistent_window();
        let mut rec = reconstruct_cycles(&state, &ticks, None).unwrap();

        // Shift every transition a second early: no raw observation backs
        // them, so the first probe fails whatever the rng picks.
        for cycle in &mut rec.cycles {
            cycle.results[29] = GREEN;
        }

        let mut rng = StdRng::seed_from_u64(7);
        let err = validate_cycles(&rec.cycles, &state, &ticks, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::DataInconsistency(_)));
        let message = err.to_string();
        assert!(message.contains("raw state observations"));
        assert!(message.contains("results"));
    }

    #[test]
    fn test_cycle_with_wrong_span_fails_structural_check() {
        let cycles = vec![Cycle {
            start: 0,
            end: 61,
            results: vec![RED; 60],
        }];
        let mut rng = StdRng::seed_from_u64(7);
        let err = validate_cycles(&cycles, &[], &[], &mut rng).unwrap_err();
        assert!(err.to_string().contains("61"));
    }

    #[test]
    fn test_transition_free_cycles_terminate() {
        // All-red cycles offer nothing to probe; validation must not spin.
        let cycles: Vec<Cycle> = (0..3)
            .map(|i| Cycle {
                start: i * 60,
                end: (i + 1) * 60,
                results: vec![RED; 60],
            })
            .collect();
        let ticks: Vec<Observation> = (0..4).map(|i| obs(i * 60, 0)).collect();
        let state = vec![obs(0, RED), obs(500, RED)];

        let mut rng = StdRng::seed_from_u64(7);
        validate_cycles(&cycles, &state, &ticks, &mut rng).unwrap();
    }

    #[test]
    fn test_empty_cycle_list_is_fine() {
        let mut rng = StdRng::seed_from_u64(7);
        validate_cycles(&[], &[], &[], &mut rng).unwrap();
    }
}
