//! # cycleflow
//!
//! Reconstruction of signal-controller phase cycles from sparse observation
//! streams: per-second cycle histories rebuilt from state changes and
//! boundary ticks, cleaned with domain rules, and grouped into
//! operating-program buckets.
//!
//! The crate is a pure transformation library. It consumes pre-ordered
//! observation rows and an injected stream catalog; querying, persistence
//! and parallel fan-out live with the caller. See the `pipeline` module for
//! the data flow.


pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;

pub use catalog::{CatalogEntry, StreamCatalog, StreamInfo, StreamKind};
pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::{
    Controller, ControllerStats, Cycle, CycleEngine, DistanceSink, EngineSummary, Observation,
    ObservationRow, Segmentation,
};
pub use query::ObservationQuery;
