//! Error taxonomy for the cycle engine
//!
//! Two kinds of failures surface as errors: data inconsistencies (a logic
//! bug or corrupted upstream data, never a recoverable condition) and
//! configuration mistakes caught before any work is attempted. Sparse or
//! missing observation data is NOT an error; it is counted in the
//! per-controller stats and processing continues.

#[derive(Debug)]
pub enum EngineError {
    /// The engine detected a state that can only be produced by a bug or by
    /// corrupted input. Carries the full diagnostic context. Processing for
    /// the affected controller must stop.
    DataInconsistency(String),

    /// Invalid configuration or request parameters, rejected up front.
    Configuration(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::DataInconsistency(msg) => write!(f, "data inconsistency: {}", msg),
            EngineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
