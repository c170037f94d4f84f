//! Engine configuration from environment variables

use std::env;

/// Configuration for the cycle engine and the replay tool.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Observations accumulated per controller before a window is
    /// processed. Bounds the memory of every per-stream buffer.
    pub window_size: usize,

    /// Run the expensive spot-check validation after each reconstruction.
    pub validation: bool,

    /// Path to the stream catalog snapshot (JSON), replay tool only.
    pub catalog_path: String,

    /// Path to the observation rows (JSONL), replay tool only.
    pub observations_path: String,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CYCLEFLOW_WINDOW_SIZE` (default: 1000)
    /// - `CYCLEFLOW_VALIDATION` (default: false)
    /// - `CYCLEFLOW_CATALOG_PATH` (default: catalog.json)
    /// - `CYCLEFLOW_OBSERVATIONS_PATH` (default: observations.jsonl)
    pub fn from_env() -> Self {
        Self {
            window_size: env::var("CYCLEFLOW_WINDOW_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),

            validation: env::var("CYCLEFLOW_VALIDATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),

            catalog_path: env::var("CYCLEFLOW_CATALOG_PATH")
                .unwrap_or_else(|_| "catalog.json".to_string()),

            observations_path: env::var("CYCLEFLOW_OBSERVATIONS_PATH")
                .unwrap_or_else(|_| "observations.jsonl".to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 1_000,
            validation: false,
            catalog_path: "catalog.json".to_string(),
            observations_path: "observations.jsonl".to_string(),
        }
    }
}
