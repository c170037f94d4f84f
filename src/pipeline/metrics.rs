//! Inter-cycle distance metric and the injected metrics sink

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Position-wise mismatch count between two result sequences.
///
/// Positions beyond the shorter sequence count as mismatches, so two
/// cycles of different length are at least as distant as their length
/// difference.
pub fn phase_wise_distance(a: &[i8], b: &[i8]) -> f64 {
    let length = a.len().max(b.len());
    let mut distance = 0.0;
    for i in 0..length {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) if x == y => {}
            _ => distance += 1.0,
        }
    }
    distance
}

/// Consumer of per-hour cycle-distance observations.
///
/// The engine only ever calls `record`; whatever aggregation happens behind
/// it (quantiles, histograms, plain logging) is the sink's business. Shared
/// across controllers, so implementations use interior mutability if they
/// accumulate.
pub trait DistanceSink: Send + Sync {
    /// `weekday` is 0 = Monday .. 6 = Sunday, `hour` 0..24, both UTC from
    /// the earlier cycle's start.
    fn record(&self, weekday: u32, hour: u32, distance: f64);
}

/// Discards every observation. The default when no sink is injected.
pub struct NullSink;

impl DistanceSink for NullSink {
    fn record(&self, _weekday: u32, _hour: u32, _distance: f64) {}
}

/// Logs every observation at debug level.
pub struct LogSink;

impl DistanceSink for LogSink {
    fn record(&self, weekday: u32, hour: u32, distance: f64) {
        log::debug!("cycle distance: weekday={} hour={} distance={}", weekday, hour, distance);
    }
}

/// (weekday, hour) bucket of a unix second, UTC. None only for timestamps
/// chrono cannot represent.
pub fn weekday_hour(timestamp: i64) -> Option<(u32, u32)> {
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    Some((datetime.weekday().num_days_from_monday(), datetime.hour()))
}
