//! Batch replay runner
//!
//! Feeds recorded observation rows through the cycle engine and prints the
//! per-controller summary. Input is one JSON row per line
//! (`{"phenomenon_time": ..., "result": ..., "stream_id": ...}`); the
//! catalog snapshot is a JSON array of entries. Rows are sorted by
//! phenomenon time before ingestion, which is the ordering the engine
//! requires.

use cycleflow::pipeline::LogSink;
use cycleflow::{CycleEngine, EngineConfig, ObservationRow, StreamCatalog};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = EngineConfig::from_env();
    log::info!("🚀 Starting cycleflow replay");
    log::info!("   catalog: {}", config.catalog_path);
    log::info!("   observations: {}", config.observations_path);
    log::info!("   window size: {}", config.window_size);
    log::info!("   validation: {}", config.validation);

    let catalog = StreamCatalog::from_json_file(&config.catalog_path)?;
    let mut engine = CycleEngine::new(catalog, config.clone(), Arc::new(LogSink));

    let file = File::open(&config.observations_path)?;
    let mut rows: Vec<ObservationRow> = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: ObservationRow = serde_json::from_str(&line)
            .map_err(|e| format!("bad row on line {}: {}", line_no + 1, e))?;
        rows.push(row);
    }
    log::info!("read {} observation rows", rows.len());

    // Stable sort keeps equal-time rows in file order, so every stream
    // stays ascending by phenomenon time.
    rows.sort_by_key(|r| r.phenomenon_time);

    for row in rows {
        engine.ingest(row)?;
    }
    engine.flush_all()?;

    for (name, segmentation) in engine.segment_all() {
        let mut programs: Vec<(&String, usize)> = segmentation
            .buckets
            .iter()
            .map(|(program, cycles)| (program, cycles.len()))
            .collect();
        programs.sort();
        log::info!(
            "{}: programs {:?}, {} ambiguous cycles dropped",
            name,
            programs,
            segmentation.ambiguous_dropped
        );
    }

    let summary = engine.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    log::info!("✅ Replay complete: {} controllers", summary.controllers.len());
    Ok(())
}
