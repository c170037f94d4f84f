//! Multi-controller engine: catalog routing and controller ownership
//!
//! The engine owns one `Controller` per physical device and routes raw
//! observation rows to them through the injected catalog snapshot. It is
//! the single entry point for ingestion; everything downstream (windowing,
//! reconstruction, cleanup, segmentation) happens inside the controllers.
//!
//! Parallel deployments partition controllers across workers up front and
//! give every worker its own engine over a disjoint catalog slice; there
//! is no shared mutable state to coordinate.

use super::controller::{Controller, ControllerStats};
use super::metrics::DistanceSink;
use super::segmenter::Segmentation;
use super::types::ObservationRow;
use crate::catalog::{StreamCatalog, StreamKind};
use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Serializable whole-run report.
#[derive(Debug, Serialize)]
pub struct EngineSummary {
    pub controllers: HashMap<String, ControllerStats>,
    pub unknown_stream_rows: u64,
    pub ignored_rows: u64,
}

pub struct CycleEngine {
    catalog: StreamCatalog,
    config: EngineConfig,
    sink: Arc<dyn DistanceSink>,
    controllers: HashMap<String, Controller>,
    /// Rows whose stream id the catalog does not know.
    unknown_stream_rows: u64,
    /// Rows on streams the catalog marks as irrelevant.
    ignored_rows: u64,
}

impl CycleEngine {
    pub fn new(catalog: StreamCatalog, config: EngineConfig, sink: Arc<dyn DistanceSink>) -> Self {
        Self {
            catalog,
            config,
            sink,
            controllers: HashMap::new(),
            unknown_stream_rows: 0,
            ignored_rows: 0,
        }
    }

    /// Route one observation row to its owning controller, creating the
    /// controller on first contact.
    pub fn ingest(&mut self, row: ObservationRow) -> Result<(), EngineError> {
        let info = match self.catalog.lookup(row.stream_id) {
            Some(info) => info,
            None => {
                self.unknown_stream_rows += 1;
                log::debug!("dropping row for unknown stream {}", row.stream_id);
                return Ok(());
            }
        };
        if info.kind == StreamKind::Ignore {
            self.ignored_rows += 1;
            return Ok(());
        }

        let controller = self
            .controllers
            .entry(info.controller.clone())
            .or_insert_with(|| {
                log::debug!("first observation for controller {}", info.controller);
                Controller::new(info.controller.clone(), self.config.clone(), self.sink.clone())
            });
        controller.ingest(info.kind, row.phenomenon_time, row.result)
    }

    /// Process every controller's buffered partial window (end-of-input).
    pub fn flush_all(&mut self) -> Result<(), EngineError> {
        for controller in self.controllers.values_mut() {
            controller.flush()?;
        }
        Ok(())
    }

    pub fn controller(&self, name: &str) -> Option<&Controller> {
        self.controllers.get(name)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.values()
    }

    /// Program buckets per controller, over each controller's stored cycles.
    pub fn segment_all(&mut self) -> HashMap<String, Segmentation> {
        self.controllers
            .iter_mut()
            .map(|(name, controller)| (name.clone(), controller.segment_programs()))
            .collect()
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            controllers: self
                .controllers
                .iter()
                .map(|(name, c)| (name.clone(), c.stats().clone()))
                .collect(),
            unknown_stream_rows: self.unknown_stream_rows,
            ignored_rows: self.ignored_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::pipeline::metrics::NullSink;
    use crate::pipeline::types::phase::{GREEN, RED};

    fn test_catalog() -> StreamCatalog {
        let entry = |stream_id, controller: &str, kind| CatalogEntry {
            stream_id,
            controller: controller.to_string(),
            kind,
        };
        StreamCatalog::new(vec![
            entry(1, "junction-a", StreamKind::State),
            entry(2, "junction-a", StreamKind::Tick),
            entry(3, "junction-b", StreamKind::State),
            entry(4, "junction-b", StreamKind::Tick),
            entry(5, "junction-a", StreamKind::Ignore),
        ])
    }

    fn row(stream_id: i64, time: i64, result: i16) -> ObservationRow {
        ObservationRow {
            phenomenon_time: time,
            result,
            stream_id,
        }
    }

    fn engine() -> CycleEngine {
        CycleEngine::new(test_catalog(), EngineConfig::default(), Arc::new(NullSink))
    }

    #[test]
    fn test_rows_route_to_their_controllers() {
        let mut engine = engine();

        // junction-a runs 60 second cycles, junction-b 90 second ones.
        for i in 0..4i64 {
            engine.ingest(row(2, i * 60, 0)).unwrap();
            engine.ingest(row(1, i * 60, RED as i16)).unwrap();
            engine.ingest(row(1, i * 60 + 30, GREEN as i16)).unwrap();
            engine.ingest(row(4, i * 90, 0)).unwrap();
            engine.ingest(row(3, i * 90, GREEN as i16)).unwrap();
            engine.ingest(row(3, i * 90 + 45, RED as i16)).unwrap();
        }
        engine.flush_all().unwrap();

        let a = engine.controller("junction-a").unwrap();
        let b = engine.controller("junction-b").unwrap();
        assert_eq!(a.cycles().len(), 3);
        assert_eq!(b.cycles().len(), 3);
        assert_eq!(a.cycles()[0].duration(), 60);
        assert_eq!(b.cycles()[0].duration(), 90);
    }

    #[test]
    fn test_unknown_and_ignored_rows_are_counted_not_fatal() {
        let mut engine = engine();

        engine.ingest(row(999, 0, 1)).unwrap();
        engine.ingest(row(5, 0, 1)).unwrap();
        engine.ingest(row(5, 10, 2)).unwrap();

        let summary = engine.summary();
        assert_eq!(summary.unknown_stream_rows, 1);
        assert_eq!(summary.ignored_rows, 2);
        // Ignored rows never create a controller.
        assert!(engine.controller("junction-a").is_none());
    }

    #[test]
    fn test_summary_serializes() {
        let mut engine = engine();
        engine.ingest(row(1, 0, RED as i16)).unwrap();
        engine.ingest(row(1, 30, GREEN as i16)).unwrap();
        engine.ingest(row(2, 0, 0)).unwrap();
        engine.ingest(row(2, 60, 0)).unwrap();
        engine.flush_all().unwrap();

        let json = serde_json::to_string(&engine.summary()).unwrap();
        assert!(json.contains("junction-a"));
        assert!(json.contains("windows_processed"));
    }
}
