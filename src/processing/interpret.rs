// src/processing/interpret.rs
//! Qualitative interpretation of index means.
//!
//! Every index has its own ordered threshold table. Each band ends at its
//! upper bound, inclusive or exclusive per band, the first band is unbounded
//! below and the last unbounded above, so any finite mean lands in exactly
//! one band. An edge excluded from one band belongs to the next.

use std::collections::BTreeMap;

use serde::Serialize;

use super::classify::LandCoverCategory;
use super::indices::SpectralIndex;
use super::statistics::IndexSummary;

pub const MIN_CONFIDENCE: f64 = 50.0;
pub const MAX_CONFIDENCE: f64 = 95.0;
/// Deducted when the dominant land cover contradicts the band
pub const CONTRADICTION_PENALTY: f64 = 15.0;

pub struct InterpretationBand {
    /// Upper bound; `None` for the last band
    pub upper: Option<f64>,
    /// Whether a value equal to `upper` falls in this band
    pub upper_inclusive: bool,
    pub status: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    /// 0-100 band score (health, water, snow...)
    pub score: u8,
    /// Dominant covers that agree with this band; empty means no check
    pub consistent_with: &'static [LandCoverCategory],
}

use LandCoverCategory::*;

const NDVI_BANDS: &[InterpretationBand] = &[
    InterpretationBand {
        upper: Some(0.2),
        upper_inclusive: false,
        status: "Sparse/bare",
        description: "Sparse vegetation or bare soil",
        color: "#FF6644",
        score: 20,
        consistent_with: &[BareSoil, Urban, Water, SnowIce, Unclassified],
    },
    InterpretationBand {
        upper: Some(0.6),
        upper_inclusive: true,
        status: "Moderate vegetation",
        description: "Moderate vegetation density, actively growing canopy",
        color: "#88CC44",
        score: 60,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: None,
        upper_inclusive: false,
        status: "Dense vegetation",
        description: "Dense, very healthy vegetation",
        color: "#44AA44",
        score: 90,
        consistent_with: &[Vegetation],
    },
];

const NDWI_BANDS: &[InterpretationBand] = &[
    InterpretationBand {
        upper: Some(-0.1),
        upper_inclusive: true,
        status: "No Water",
        description: "Dry vegetation, bare soil, or built-up areas",
        color: "#8B4513",
        score: 10,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.1),
        upper_inclusive: true,
        status: "Low Water Content",
        description: "Slightly moist soil or sparse vegetation",
        color: "#87CEEB",
        score: 40,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.3),
        upper_inclusive: true,
        status: "Moderate Water Content",
        description: "Moist vegetation or shallow water",
        color: "#4A9FDB",
        score: 70,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: None,
        upper_inclusive: false,
        status: "High Water Content",
        description: "Strong water presence or very moist vegetation",
        color: "#0077BE",
        score: 90,
        consistent_with: &[Water, Vegetation],
    },
];

const MNDWI_BANDS: &[InterpretationBand] = &[
    InterpretationBand {
        upper: Some(-0.3),
        upper_inclusive: true,
        status: "Dry surface",
        description: "Dry soil, dense canopy or built-up surfaces",
        color: "#8B4513",
        score: 10,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.0),
        upper_inclusive: true,
        status: "Low surface moisture",
        description: "Land surface with little standing moisture",
        color: "#D2B48C",
        score: 35,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.3),
        upper_inclusive: true,
        status: "Moist surface",
        description: "Wet soil, flooded vegetation or shallow water",
        color: "#4A9FDB",
        score: 65,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: None,
        upper_inclusive: false,
        status: "Open water",
        description: "Open water bodies",
        color: "#0077BE",
        score: 90,
        consistent_with: &[Water],
    },
];

const NDSI_BANDS: &[InterpretationBand] = &[
    InterpretationBand {
        upper: Some(-0.1),
        upper_inclusive: true,
        status: "Vegetation/Water",
        description: "Vegetation or water bodies (no snow)",
        color: "#228B22",
        score: 5,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.1),
        upper_inclusive: true,
        status: "No Snow",
        description: "Clear ground or sparse vegetation",
        color: "#90EE90",
        score: 20,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: Some(0.4),
        upper_inclusive: true,
        status: "Possible Snow/Ice",
        description: "Light snow cover or mixed snow-vegetation",
        color: "#F0F8FF",
        score: 60,
        consistent_with: &[],
    },
    InterpretationBand {
        upper: None,
        upper_inclusive: false,
        status: "Snow/Ice Present",
        description: "Strong snow or ice cover",
        color: "#FFFFFF",
        score: 90,
        consistent_with: &[SnowIce],
    },
];

/// Threshold table of an index, lowest band first
pub fn table(index: SpectralIndex) -> &'static [InterpretationBand] {
    match index {
        SpectralIndex::Ndvi => NDVI_BANDS,
        SpectralIndex::Ndwi => NDWI_BANDS,
        SpectralIndex::Mndwi => MNDWI_BANDS,
        SpectralIndex::Ndsi => NDSI_BANDS,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    /// Index mean the interpretation is based on
    pub value: f64,
    pub status: String,
    pub description: String,
    /// 0-100
    pub confidence: f64,
    pub color: String,
    pub score: u8,
    pub land_cover_consistent: bool,
}

/// Position of `value` in `bands`: (band number, lower bound, upper bound)
fn locate(bands: &[InterpretationBand], value: f64) -> (usize, Option<f64>, Option<f64>) {
    let mut lower = None;
    for (i, band) in bands.iter().enumerate() {
        match band.upper {
            Some(upper) if value > upper || (value == upper && !band.upper_inclusive) => {
                lower = Some(upper)
            }
            upper => return (i, lower, upper),
        }
    }
    // Tables always end with an open band
    (bands.len() - 1, lower, None)
}

/// Confidence from the distance to the nearest band boundary relative to
/// half the band width. Open bands borrow the width of their neighbour.
pub fn confidence(bands: &[InterpretationBand], value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_CONFIDENCE;
    }
    let (i, lower, upper) = locate(bands, value);

    let (distance, width) = match (lower, upper) {
        (Some(l), Some(u)) => ((value - l).min(u - value), u - l),
        (None, Some(u)) => (u - value, neighbour_width(bands, i + 1)),
        (Some(l), None) => (value - l, neighbour_width(bands, i.saturating_sub(1))),
        (None, None) => return MAX_CONFIDENCE,
    };

    let depth = if width > 0.0 {
        (distance / (width / 2.0)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (MIN_CONFIDENCE + (MAX_CONFIDENCE - MIN_CONFIDENCE) * depth).clamp(0.0, 100.0)
}

fn neighbour_width(bands: &[InterpretationBand], i: usize) -> f64 {
    let upper = bands.get(i).and_then(|b| b.upper);
    let lower = i.checked_sub(1).and_then(|p| bands.get(p)).and_then(|b| b.upper);
    match (lower, upper) {
        (Some(l), Some(u)) => u - l,
        _ => 0.0,
    }
}

/// Interpret one index mean in the context of the dominant land cover.
pub fn interpret(index: SpectralIndex, mean: f64, dominant: LandCoverCategory) -> Interpretation {
    let bands = table(index);
    let (i, _, _) = locate(bands, mean);
    let band = &bands[i];

    let consistent = band.consistent_with.is_empty() || band.consistent_with.contains(&dominant);
    let mut confidence = confidence(bands, mean);
    if !consistent {
        confidence = (confidence - CONTRADICTION_PENALTY).clamp(0.0, 100.0);
    }

    Interpretation {
        value: mean,
        status: band.status.to_string(),
        description: band.description.to_string(),
        confidence,
        color: band.color.to_string(),
        score: band.score,
        land_cover_consistent: consistent,
    }
}

/// Interpretations for every index that has statistics
pub fn interpret_all(
    summaries: &BTreeMap<SpectralIndex, IndexSummary>,
    dominant: LandCoverCategory,
) -> BTreeMap<SpectralIndex, Interpretation> {
    summaries
        .iter()
        .filter_map(|(index, summary)| {
            summary
                .statistics()
                .map(|stats| (*index, interpret(*index, stats.mean, dominant)))
        })
        .collect()
}
