//! Core data structures for cycle reconstruction

use serde::{Deserialize, Serialize};

/// Signal phase codes as they appear in the raw observation stream.
///
/// Only red, amber, green and red-amber take part in transition checking;
/// everything else resets the tracked state.
pub mod phase {
    pub const DARK: i8 = 0;
    pub const RED: i8 = 1;
    pub const AMBER: i8 = 2;
    pub const GREEN: i8 = 3;
    pub const RED_AMBER: i8 = 4;
    pub const AMBER_FLASHING: i8 = 5;
    pub const GREEN_FLASHING: i8 = 6;
}

/// A single observation: the second it was made and the observed value.
///
/// Observations are change events. A value holds from its own timestamp
/// until the next observation on the same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub time: i64,
    pub value: i8,
}

impl Observation {
    pub fn new(time: i64, value: i8) -> Self {
        Self { time, value }
    }
}

/// One raw row from the observation source, before catalog routing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObservationRow {
    pub phenomenon_time: i64,
    pub result: i16,
    pub stream_id: i64,
}

/// A reconstructed phase cycle with its per-second state history.
///
/// Invariant: `end - start == results.len()`, one value per second in
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub start: i64,
    pub end: i64,
    pub results: Vec<i8>,
}

impl Cycle {
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

/// The three per-stream observation buffers of one controller.
#[derive(Debug, Default, Clone)]
pub struct StreamBuffers {
    pub state: Vec<Observation>,
    pub tick: Vec<Observation>,
    pub regime: Vec<Observation>,
}

impl StreamBuffers {
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.tick.is_empty() && self.regime.is_empty()
    }
}
