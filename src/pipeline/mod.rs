//! # Cycle Reconstruction Pipeline
//!
//! Turns three sparse observation streams per signal controller into
//! validated, second-resolution phase cycles grouped by operating program.
//!
//! ## Architecture
//!
//! ```text
//! ObservationRow
//!     ↓ (catalog routing)
//! CycleEngine::ingest()
//!     ↓
//! Controller (per-stream buffers, window counter)
//!     ↓ (window threshold reached)
//! reconstruct_cycles()  -- state + tick streams to Vec<Cycle> + residue
//!     ↓
//! validate_cycles()     -- optional raw-buffer spot checks
//!     ↓
//! clean_cycles()        -- length / transition / duration rules
//!     ↓
//! segment_cycles()      -- regime stream to program buckets
//! ```
//!
//! Everything is synchronous and CPU-only. Each controller is single-writer;
//! parallelism comes from partitioning controllers across workers with an
//! engine each.
//!
//! ## Module Organization
//!
//! - `types` - Observations, cycles, per-stream buffers
//! - `reconstructor` - Tick-interval reconstruction with carried state
//! - `validator` - Opt-in consistency spot checks
//! - `cleaner` - Rule-based removal of invalid cycles
//! - `segmenter` - Program bucketing from the regime stream
//! - `metrics` - Inter-cycle distance and the injected sink
//! - `controller` - Per-controller windowing and counters
//! - `engine` - Catalog-routed multi-controller ownership

pub mod cleaner;
pub mod controller;
pub mod engine;
pub mod metrics;
pub mod reconstructor;
pub mod segmenter;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use cleaner::{clean_cycles, CleanupCounts};
pub use controller::{Controller, ControllerStats};
pub use engine::{CycleEngine, EngineSummary};
pub use metrics::{phase_wise_distance, DistanceSink, LogSink, NullSink};
pub use reconstructor::{reconstruct_cycles, Reconstruction};
pub use segmenter::{segment_cycles, Segmentation, UNKNOWN_PROGRAM};
pub use types::{Cycle, Observation, ObservationRow, StreamBuffers};
pub use validator::validate_cycles;
