//! Observation query construction for the external store
//!
//! The engine does not talk to the observation store itself; it only
//! prepares the query text for whoever does. Malformed requests are
//! rejected here, before any I/O could be attempted.

use crate::error::EngineError;

/// A request for observation rows: which streams, which time ranges.
#[derive(Debug, Clone)]
pub struct ObservationQuery {
    stream_ids: Vec<i64>,
    /// Inclusive (start, end) pairs of unix seconds.
    time_ranges: Vec<(i64, i64)>,
}

impl ObservationQuery {
    pub fn new(stream_ids: Vec<i64>, time_ranges: Vec<(i64, i64)>) -> Self {
        Self {
            stream_ids,
            time_ranges,
        }
    }

    /// Build the SELECT text for the observation store.
    ///
    /// Rows come back as (phenomenon_time, result, stream_id). Ordering is
    /// the caller's duty; the engine requires ascending phenomenon_time
    /// per stream.
    pub fn build_sql(&self) -> Result<String, EngineError> {
        if self.stream_ids.is_empty() {
            return Err(EngineError::Configuration(
                "observation query without stream ids".to_string(),
            ));
        }
        if self.time_ranges.is_empty() {
            return Err(EngineError::Configuration(
                "observation query without time ranges".to_string(),
            ));
        }
        for &(start, end) in &self.time_ranges {
            if end <= start {
                return Err(EngineError::Configuration(format!(
                    "observation query with empty time range [{}, {}]",
                    start, end
                )));
            }
        }

        let ids = self
            .stream_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let ranges = self
            .time_ranges
            .iter()
            .map(|(start, end)| {
                format!("(phenomenon_time >= {} AND phenomenon_time <= {})", start, end)
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        Ok(format!(
            "SELECT phenomenon_time, result, stream_id FROM observations \
             WHERE stream_id IN ({}) AND ({})",
            ids, ranges
        ))
    }
}
