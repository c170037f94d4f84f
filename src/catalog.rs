//! Read-only stream catalog snapshot
//!
//! Maps stream identifiers to their owning controller and stream kind.
//! The snapshot is built once (from entries or a JSON file) and injected
//! into the engine at construction; nothing ever reloads it.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// What a stream carries for its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Signal colour changes.
    State,
    /// Cycle boundary markers.
    Tick,
    /// Active operating-program changes.
    Regime,
    /// Known stream that is irrelevant for cycle reconstruction.
    Ignore,
}

/// One catalog row, as stored in the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub stream_id: i64,
    pub controller: String,
    pub kind: StreamKind,
}

/// Resolved catalog information for a stream id.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub controller: String,
    pub kind: StreamKind,
}

/// The injected snapshot. Lookup only.
#[derive(Debug, Default, Clone)]
pub struct StreamCatalog {
    by_id: HashMap<i64, StreamInfo>,
}

impl StreamCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let by_id = entries
            .into_iter()
            .map(|e| {
                (
                    e.stream_id,
                    StreamInfo {
                        controller: e.controller,
                        kind: e.kind,
                    },
                )
            })
            .collect();
        Self { by_id }
    }

    /// Load a snapshot from a JSON file holding an array of entries.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&raw).map_err(|e| {
            EngineError::Configuration(format!("cannot parse catalog {}: {}", path.display(), e))
        })?;
        log::info!("loaded catalog snapshot: {} streams from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }

    pub fn lookup(&self, stream_id: i64) -> Option<&StreamInfo> {
        self.by_id.get(&stream_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
