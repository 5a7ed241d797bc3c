// src/lib.rs
//! Spectral index, land-cover and crop health analysis for agricultural
//! fields observed as co-registered reflectance bands.

pub mod analysis;
pub mod bands;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod processing;
pub mod utils;

pub use analysis::{analyze, AnalysisRequest, AnalysisResult};
pub use error::{AnalysisError, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
