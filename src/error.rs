// src/error.rs
use thiserror::Error;

use crate::bands::Band;
use crate::processing::indices::SpectralIndex;

/// Errors produced by the analysis engine
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Band length mismatch: {band} has {actual} samples, expected {expected}")]
    DimensionMismatch {
        band: Band,
        expected: usize,
        actual: usize,
    },

    #[error("Band {0} contains no samples")]
    EmptyBand(Band),

    #[error("Unknown band name: {0}")]
    UnknownBand(String),

    #[error("Insufficient data: no spectral index can be computed from the supplied bands")]
    InsufficientData,

    #[error("No valid samples for {0}")]
    NoValidSamples(SpectralIndex),

    #[error("Insufficient signal: NDVI statistics are required for health and pest scoring")]
    InsufficientSignal,

    #[error("Invalid scoring configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
