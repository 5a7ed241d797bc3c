// src/processing/quality.rs
use super::indices::{IndexSeries, SpectralIndex};
use super::statistics::IndexStatistics;

/// Below this standard deviation a larger sample is suspiciously uniform
const MIN_VARIATION: f64 = 0.001;
const MIN_SAMPLES_FOR_VARIATION: usize = 10;
const MIN_PLAUSIBLE_NDVI_MEAN: f64 = -0.5;

/// Data-quality notes for one index series. Never fails; the notes are
/// informational and the values are used as computed.
pub fn assess(series: &IndexSeries, stats: Option<&IndexStatistics>) -> Vec<String> {
    let mut notes = Vec::new();
    let index = series.index();

    let invalid = series.len() - series.valid_count();
    if invalid > 0 {
        notes.push(format!(
            "{index}: {invalid} of {} pixels are invalid (zero band sum or non-finite input) and were excluded",
            series.len()
        ));
    }

    let out_of_range = series
        .valid_values()
        .filter(|v| !(-1.0..=1.0).contains(v))
        .count();
    if out_of_range > 0 {
        notes.push(format!(
            "{index}: {out_of_range} values fall outside [-1, 1] (passed through unclamped, check input reflectance)"
        ));
    }

    if let Some(stats) = stats {
        if stats.count > MIN_SAMPLES_FOR_VARIATION && stats.std < MIN_VARIATION {
            notes.push(format!(
                "{index}: values show no variation (std {:.4}), possible data quality issue",
                stats.std
            ));
        }
        if index == SpectralIndex::Ndvi && stats.mean < MIN_PLAUSIBLE_NDVI_MEAN {
            notes.push(format!(
                "NDVI: mean {:.3} is implausibly low, check data quality",
                stats.mean
            ));
        }
    }

    notes
}
