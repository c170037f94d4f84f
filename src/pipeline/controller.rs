//! Per-controller orchestration: buffering, windowing, carried state
//!
//! One `Controller` owns the three observation buffers, the cleaned cycles
//! of the last processed window, the state value carried across window
//! boundaries and the cumulative counters for one physical signal
//! controller. Ingest is single-writer; callers that share a controller
//! across threads serialize access themselves.
//!
//! The windowing discipline is the memory contract: buffers grow to the
//! configured window size, then one pipeline pass consumes them and
//! installs the residue wholesale. History never accumulates unboundedly.

use super::cleaner::clean_cycles;
use super::metrics::{phase_wise_distance, weekday_hour, DistanceSink};
use super::reconstructor::reconstruct_cycles;
use super::segmenter::{segment_cycles, Segmentation};
use super::types::{Cycle, Observation, StreamBuffers};
use super::validator::validate_cycles;
use crate::catalog::StreamKind;
use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Serialize;
use std::sync::Arc;

/// Cumulative counters for one controller.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ControllerStats {
    pub windows_processed: u32,
    /// Windows that arrived without any state / tick observations.
    pub state_stream_missing: u32,
    pub tick_stream_missing: u32,
    /// Complete tick intervals that had no governing state at their start.
    pub skipped_cycles: u32,
    /// Consecutive cleaned cycles that were not time-contiguous.
    pub gaps_between_cycles: u32,
    pub total_cycles: u32,
    pub removed_cycles: u32,
    pub removed_length_outliers: u32,
    pub removed_illegal_transitions: u32,
    pub removed_duration_cap: u32,
    /// Cycles dropped by the segmenter for straddling a regime boundary.
    pub ambiguous_regime_drops: u32,
}

pub struct Controller {
    name: String,
    config: EngineConfig,
    sink: Arc<dyn DistanceSink>,

    buffers: StreamBuffers,
    /// Observations appended since the last processed window.
    pending: usize,

    /// Cleaned cycles of the last processed window.
    cycles: Vec<Cycle>,
    /// Last governing state of the previous window, if any.
    carried_state: Option<i8>,

    stats: ControllerStats,
}

impl Controller {
    pub fn new(name: String, config: EngineConfig, sink: Arc<dyn DistanceSink>) -> Self {
        Self {
            name,
            config,
            sink,
            buffers: StreamBuffers::default(),
            pending: 0,
            cycles: Vec::new(),
            carried_state: None,
            stats: ControllerStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Cleaned cycles of the last processed window.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Append one observation; process a window once enough accumulated.
    ///
    /// Values must fit the 8-bit phase/program encoding; anything larger
    /// can only come from corrupted input.
    pub fn ingest(&mut self, kind: StreamKind, time: i64, value: i16) -> Result<(), EngineError> {
        let value = i8::try_from(value).map_err(|_| {
            EngineError::DataInconsistency(format!(
                "observation value {} at {} for controller {} does not fit the 8-bit encoding",
                value, time, self.name
            ))
        })?;

        match kind {
            StreamKind::State => self.buffers.state.push(Observation::new(time, value)),
            StreamKind::Tick => self.buffers.tick.push(Observation::new(time, value)),
            StreamKind::Regime => self.buffers.regime.push(Observation::new(time, value)),
            StreamKind::Ignore => return Ok(()),
        }

        self.pending += 1;
        if self.pending > self.config.window_size {
            self.process_window()?;
            self.pending = 0;
        }
        Ok(())
    }

    /// Process whatever is buffered, regardless of the window threshold.
    /// Called once at end-of-input.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if self.pending == 0 {
            return Ok(());
        }
        self.process_window()?;
        self.pending = 0;
        Ok(())
    }

    /// Bucket the stored cycles by operating program.
    pub fn segment_programs(&mut self) -> Segmentation {
        let segmentation = segment_cycles(&self.cycles, &self.buffers.regime);
        self.stats.ambiguous_regime_drops += segmentation.ambiguous_dropped;
        segmentation
    }

    /// One full pipeline pass: distances over the previous window's cycles,
    /// reconstruction, optional validation, residue hand-over, cleanup.
    fn process_window(&mut self) -> Result<(), EngineError> {
        self.stats.windows_processed += 1;
        self.record_distances();

        let reconstruction =
            reconstruct_cycles(&self.buffers.state, &self.buffers.tick, self.carried_state)?;

        if self.config.validation {
            validate_cycles(
                &reconstruction.cycles,
                &self.buffers.state,
                &self.buffers.tick,
                &mut rand::thread_rng(),
            )?;
        }

        if reconstruction.state_missing {
            self.stats.state_stream_missing += 1;
            log::warn!("controller {}: window without state observations", self.name);
        }
        if reconstruction.tick_missing {
            self.stats.tick_stream_missing += 1;
            log::warn!("controller {}: window without tick observations", self.name);
        }
        self.stats.skipped_cycles += reconstruction.skipped_cycles;

        if reconstruction.cycles.is_empty() {
            // Nothing usable yet: keep every observation for the next
            // window, leave cycles and carried state as they are.
            log::debug!("controller {}: window yielded no cycles", self.name);
            return Ok(());
        }

        // The terminating observation of the last cycle doubles as the
        // opening observation of the next one, hence >= when splitting off
        // the residue.
        let final_end = reconstruction
            .cycles
            .last()
            .map(|c| c.end)
            .unwrap_or_default();
        self.carried_state = reconstruction
            .cycles
            .last()
            .and_then(|c| c.results.last())
            .copied();
        self.buffers.state = split_residue(&mut self.buffers.state, final_end);
        self.buffers.tick = split_residue(&mut self.buffers.tick, final_end);

        let (cleaned, counts) = clean_cycles(reconstruction.cycles);
        self.stats.total_cycles += counts.processed;
        self.stats.removed_cycles += counts.removed;
        self.stats.removed_length_outliers += counts.length_outliers;
        self.stats.removed_illegal_transitions += counts.illegal_transitions;
        self.stats.removed_duration_cap += counts.duration_cap_violations;

        // Regime observations are not consumed by reconstruction. Keep the
        // suffix that can still govern a stored cycle: everything from the
        // last observation at or before the first cycle start.
        let anchor = cleaned.first().map(|c| c.start).unwrap_or(final_end);
        let keep_from = self
            .buffers
            .regime
            .partition_point(|o| o.time <= anchor)
            .saturating_sub(1);
        self.buffers.regime = self.buffers.regime.split_off(keep_from);

        log::debug!(
            "controller {}: window produced {} cycles ({} removed, {} skipped intervals)",
            self.name,
            cleaned.len(),
            counts.removed,
            reconstruction.skipped_cycles
        );

        self.cycles = cleaned;
        Ok(())
    }

    /// Feed consecutive-cycle distances from the previous window into the
    /// sink, bucketed by the earlier cycle's weekday and hour.
    fn record_distances(&mut self) {
        for pair in self.cycles.windows(2) {
            if pair[0].end != pair[1].start {
                self.stats.gaps_between_cycles += 1;
            }
            let distance = phase_wise_distance(&pair[0].results, &pair[1].results);
            if let Some((weekday, hour)) = weekday_hour(pair[0].start) {
                self.sink.record(weekday, hour, distance);
            }
        }
    }
}

/// Split off the observations at or after `cut`, replacing the buffer
/// wholesale. Both slices stay in their original order.
fn split_residue(buffer: &mut Vec<Observation>, cut: i64) -> Vec<Observation> {
    let at = buffer.partition_point(|o| o.time < cut);
    buffer.split_off(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metrics::NullSink;
    use crate::pipeline::segmenter::UNKNOWN_PROGRAM;
    use crate::pipeline::types::phase::{GREEN, RED};
    use std::sync::Mutex;

    fn small_window_config(window_size: usize) -> EngineConfig {
        EngineConfig {
            window_size,
            ..EngineConfig::default()
        }
    }

    fn controller(window_size: usize) -> Controller {
        Controller::new(
            "junction-test".to_string(),
            small_window_config(window_size),
            Arc::new(NullSink),
        )
    }

    /// Feed `cycle_count` uniform 60 second cycles starting at `from`:
    /// a tick each minute, red then green within each cycle.
    fn feed_uniform_cycles(controller: &mut Controller, from: i64, cycle_count: i64) {
        for i in 0..cycle_count {
            let start = from + i * 60;
            controller.ingest(StreamKind::Tick, start, 0).unwrap();
            controller.ingest(StreamKind::State, start, RED as i16).unwrap();
            controller
                .ingest(StreamKind::State, start + 30, GREEN as i16)
                .unwrap();
        }
        controller
            .ingest(StreamKind::Tick, from + cycle_count * 60, 0)
            .unwrap();
    }

    #[test]
    fn test_window_threshold_triggers_processing() {
        let mut controller = controller(30);
        feed_uniform_cycles(&mut controller, 0, 10);
        // 10 ticks + 20 state obs + closing tick = 31 > 30: one window.
        assert_eq!(controller.stats().windows_processed, 1);
        assert_eq!(controller.cycles().len(), 10);
        for cycle in controller.cycles() {
            assert_eq!(cycle.duration(), 60);
        }
    }

    #[test]
    fn test_below_threshold_buffers_only() {
        let mut controller = controller(1_000);
        feed_uniform_cycles(&mut controller, 0, 10);
        assert_eq!(controller.stats().windows_processed, 0);
        assert!(controller.cycles().is_empty());

        controller.flush().unwrap();
        assert_eq!(controller.stats().windows_processed, 1);
        assert_eq!(controller.cycles().len(), 10);
    }

    #[test]
    fn test_flush_is_idempotent_when_nothing_pending() {
        let mut controller = controller(1_000);
        controller.flush().unwrap();
        assert_eq!(controller.stats().windows_processed, 0);
    }

    #[test]
    fn test_missing_stream_window_counts_and_retains() {
        let mut controller = controller(3);
        // Only tick observations: the window is unprocessable.
        for i in 0..4 {
            controller.ingest(StreamKind::Tick, i * 60, 0).unwrap();
        }
        assert_eq!(controller.stats().windows_processed, 1);
        assert_eq!(controller.stats().state_stream_missing, 1);
        assert_eq!(controller.stats().tick_stream_missing, 0);
        assert!(controller.cycles().is_empty());

        // The retained ticks combine with late-arriving state observations.
        controller.ingest(StreamKind::State, 0, RED as i16).unwrap();
        controller
            .ingest(StreamKind::State, 30, GREEN as i16)
            .unwrap();
        controller.flush().unwrap();
        assert_eq!(controller.cycles().len(), 3);
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let mut controller = controller(10);
        let err = controller.ingest(StreamKind::State, 0, 400).unwrap_err();
        assert!(matches!(err, EngineError::DataInconsistency(_)));
    }

    #[test]
    fn test_cleanup_counters_accumulate() {
        let mut controller = controller(1_000);
        feed_uniform_cycles(&mut controller, 0, 6);
        // One extra short cycle: tick 10 seconds after the last boundary.
        controller.ingest(StreamKind::Tick, 6 * 60 + 10, 0).unwrap();
        controller.flush().unwrap();

        assert_eq!(controller.stats().total_cycles, 7);
        assert_eq!(controller.stats().removed_cycles, 1);
        assert_eq!(controller.stats().removed_length_outliers, 1);
        assert_eq!(controller.cycles().len(), 6);
    }

    #[test]
    fn test_segmentation_accumulates_drop_counter() {
        let mut controller = controller(1_000);
        feed_uniform_cycles(&mut controller, 0, 4);
        // Regime boundary in the middle of the second cycle.
        controller.ingest(StreamKind::Regime, 90, 7).unwrap();
        controller.flush().unwrap();

        let segmentation = controller.segment_programs();
        assert_eq!(segmentation.ambiguous_dropped, 1);
        assert_eq!(segmentation.buckets[UNKNOWN_PROGRAM].len(), 1);
        assert_eq!(segmentation.buckets["7"].len(), 2);
        assert_eq!(controller.stats().ambiguous_regime_drops, 1);
    }

    #[test]
    fn test_distances_recorded_for_previous_window() {
        struct CollectingSink(Mutex<Vec<(u32, u32, f64)>>);
        impl DistanceSink for CollectingSink {
            fn record(&self, weekday: u32, hour: u32, distance: f64) {
                self.0.lock().unwrap().push((weekday, hour, distance));
            }
        }

        let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
        let mut controller = Controller::new(
            "junction-test".to_string(),
            small_window_config(1_000),
            sink.clone(),
        );

        feed_uniform_cycles(&mut controller, 0, 5);
        controller.flush().unwrap();
        // Distances cover the window before the current one.
        assert!(sink.0.lock().unwrap().is_empty());

        // The tick at 300 stayed buffered as residue; continue after it.
        controller.ingest(StreamKind::State, 300, RED as i16).unwrap();
        controller
            .ingest(StreamKind::State, 330, GREEN as i16)
            .unwrap();
        controller.ingest(StreamKind::Tick, 360, 0).unwrap();
        controller.flush().unwrap();

        let recorded = sink.0.lock().unwrap();
        // 5 stored cycles give 4 consecutive pairs, all identical.
        assert_eq!(recorded.len(), 4);
        assert!(recorded.iter().all(|&(_, _, d)| d == 0.0));
    }
}
