// src/processing/statistics.rs
use std::collections::BTreeMap;

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use super::indices::{IndexSeries, IndexSet, SpectralIndex};
use crate::error::{AnalysisError, Result};

/// Summary statistics over the valid pixels of one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Number of valid samples, not raw pixels
    pub count: usize,
    pub percentiles: Percentiles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    #[serde(rename = "25th")]
    pub p25: f64,
    #[serde(rename = "75th")]
    pub p75: f64,
    #[serde(rename = "90th")]
    pub p90: f64,
}

/// Statistics of an index, or why there are none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexSummary {
    Computed(IndexStatistics),
    NoValidSamples { total_pixels: usize },
}

impl IndexSummary {
    pub fn statistics(&self) -> Option<&IndexStatistics> {
        match self {
            IndexSummary::Computed(stats) => Some(stats),
            IndexSummary::NoValidSamples { .. } => None,
        }
    }
}

/// Compute statistics over the valid entries of `series`.
pub fn summarize(series: &IndexSeries) -> Result<IndexStatistics> {
    let sorted: Vec<f64> = series
        .valid_values()
        .sorted_by(|a, b| a.total_cmp(b))
        .collect();

    let (min, max) = match sorted.iter().minmax() {
        MinMaxResult::NoElements => return Err(AnalysisError::NoValidSamples(series.index())),
        MinMaxResult::OneElement(v) => (*v, *v),
        MinMaxResult::MinMax(lo, hi) => (*lo, *hi),
    };

    let count = sorted.len();
    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(IndexStatistics {
        mean,
        median: median(&sorted),
        std: variance.sqrt(),
        min,
        max,
        count,
        percentiles: Percentiles {
            p25: percentile(&sorted, 25.0),
            p75: percentile(&sorted, 75.0),
            p90: percentile(&sorted, 90.0),
        },
    })
}

/// Summaries for every computed index; indices without valid samples are
/// reported as such instead of carrying NaN statistics.
pub fn summarize_all(indices: &IndexSet) -> BTreeMap<SpectralIndex, IndexSummary> {
    indices
        .iter()
        .map(|(index, series)| {
            let summary = match summarize(series) {
                Ok(stats) => IndexSummary::Computed(stats),
                Err(_) => IndexSummary::NoValidSamples {
                    total_pixels: series.len(),
                },
            };
            (*index, summary)
        })
        .collect()
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Linear interpolation between closest ranks
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
