// src/io/reader.rs
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::analysis::AnalysisRequest;
use crate::error::Result;

/// Parse an analysis request from a JSON file.
pub fn read_request<P: AsRef<Path>>(path: P) -> Result<AnalysisRequest> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    Plain(Vec<f64>),
    Wrapped { ndvi_history: Vec<f64> },
}

/// Read an NDVI history, either a bare JSON array or an object with an
/// `ndvi_history` array.
pub fn read_history<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path)?;
    let parsed: HistoryFile = serde_json::from_str(&content)?;
    let history = match parsed {
        HistoryFile::Plain(values) => values,
        HistoryFile::Wrapped { ndvi_history } => ndvi_history,
    };
    Ok(history)
}
