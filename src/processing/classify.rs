// src/processing/classify.rs
//! Rule-based land-cover classification.
//!
//! Each pixel is tested against [`RULES`] in order and takes the category of
//! the first rule that matches. The order encodes priority: snow masks water,
//! water masks vegetation, and so on.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::indices::{IndexSet, SpectralIndex};
use crate::error::{AnalysisError, Result};

pub const SNOW_NDSI: f64 = 0.4;
pub const WATER_NDWI: f64 = 0.3;
pub const WATER_MNDWI: f64 = 0.3;
pub const VEGETATION_NDVI: f64 = 0.2;
pub const BARE_SOIL_NDVI_MIN: f64 = -0.1;
pub const BARE_SOIL_MNDWI_MAX: f64 = 0.0;

/// Land-cover categories in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LandCoverCategory {
    Water,
    Vegetation,
    #[serde(rename = "Snow/Ice")]
    SnowIce,
    #[serde(rename = "Urban/Built-up")]
    Urban,
    #[serde(rename = "Bare Soil")]
    BareSoil,
    Unclassified,
}

impl LandCoverCategory {
    pub const ALL: [LandCoverCategory; 6] = [
        LandCoverCategory::Water,
        LandCoverCategory::Vegetation,
        LandCoverCategory::SnowIce,
        LandCoverCategory::Urban,
        LandCoverCategory::BareSoil,
        LandCoverCategory::Unclassified,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LandCoverCategory::Water => "Water",
            LandCoverCategory::Vegetation => "Vegetation",
            LandCoverCategory::SnowIce => "Snow/Ice",
            LandCoverCategory::Urban => "Urban/Built-up",
            LandCoverCategory::BareSoil => "Bare Soil",
            LandCoverCategory::Unclassified => "Unclassified",
        }
    }

    /// Display color
    pub fn color(&self) -> &'static str {
        match self {
            LandCoverCategory::Water => "#6A5ACD",
            LandCoverCategory::Vegetation => "#228B22",
            LandCoverCategory::SnowIce => "#FF00FF",
            LandCoverCategory::Urban => "#696969",
            LandCoverCategory::BareSoil => "#D2B48C",
            LandCoverCategory::Unclassified => "#808080",
        }
    }
}

impl fmt::Display for LandCoverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Valid index values of a single pixel; `None` for invalid or absent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelIndices {
    pub ndvi: Option<f64>,
    pub ndwi: Option<f64>,
    pub mndwi: Option<f64>,
    pub ndsi: Option<f64>,
}

impl PixelIndices {
    pub fn at(indices: &IndexSet, i: usize) -> Self {
        let value = |index: SpectralIndex| indices.get(&index).and_then(|s| s.get(i).value());
        Self {
            ndvi: value(SpectralIndex::Ndvi),
            ndwi: value(SpectralIndex::Ndwi),
            mndwi: value(SpectralIndex::Mndwi),
            ndsi: value(SpectralIndex::Ndsi),
        }
    }

    pub fn has_any(&self) -> bool {
        self.ndvi.is_some() || self.ndwi.is_some() || self.mndwi.is_some() || self.ndsi.is_some()
    }
}

/// One entry of the ordered decision list
pub struct LandCoverRule {
    pub name: &'static str,
    pub category: LandCoverCategory,
    pub matches: fn(&PixelIndices) -> bool,
}

fn is_snow(p: &PixelIndices) -> bool {
    p.ndsi.is_some_and(|v| v > SNOW_NDSI)
}

fn is_water(p: &PixelIndices) -> bool {
    p.ndwi.is_some_and(|v| v > WATER_NDWI) || p.mndwi.is_some_and(|v| v > WATER_MNDWI)
}

fn is_vegetation(p: &PixelIndices) -> bool {
    p.ndvi.is_some_and(|v| v > VEGETATION_NDVI)
}

fn is_bare_soil(p: &PixelIndices) -> bool {
    p.ndvi
        .is_some_and(|v| (BARE_SOIL_NDVI_MIN..=VEGETATION_NDVI).contains(&v))
        && p.mndwi.map_or(true, |m| m < BARE_SOIL_MNDWI_MAX)
}

fn has_no_signal(p: &PixelIndices) -> bool {
    !p.has_any()
}

fn any_pixel(_: &PixelIndices) -> bool {
    true
}

/// Land-cover rules, highest priority first. The last rule always matches.
pub const RULES: &[LandCoverRule] = &[
    LandCoverRule {
        name: "snow_ice",
        category: LandCoverCategory::SnowIce,
        matches: is_snow,
    },
    LandCoverRule {
        name: "water",
        category: LandCoverCategory::Water,
        matches: is_water,
    },
    LandCoverRule {
        name: "vegetation",
        category: LandCoverCategory::Vegetation,
        matches: is_vegetation,
    },
    LandCoverRule {
        name: "bare_soil",
        category: LandCoverCategory::BareSoil,
        matches: is_bare_soil,
    },
    LandCoverRule {
        name: "no_signal",
        category: LandCoverCategory::Unclassified,
        matches: has_no_signal,
    },
    LandCoverRule {
        name: "urban",
        category: LandCoverCategory::Urban,
        matches: any_pixel,
    },
];

pub fn classify_pixel(pixel: &PixelIndices) -> LandCoverCategory {
    RULES
        .iter()
        .find(|rule| (rule.matches)(pixel))
        .map(|rule| rule.category)
        .unwrap_or(LandCoverCategory::Unclassified)
}

/// Share of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub percentage: f64,
    pub color: String,
    pub pixel_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandCoverAnalysis {
    /// Every category, including those with no pixels
    pub land_cover_stats: BTreeMap<LandCoverCategory, CategoryShare>,
    pub dominant_land_cover: LandCoverCategory,
    pub total_pixels: usize,
    #[serde(skip)]
    pub pixel_categories: Vec<LandCoverCategory>,
}

/// Classify every pixel and aggregate category shares. Fails when no index
/// has a single valid sample, whether it was never computed or every pixel
/// came out invalid.
pub fn classify(indices: &IndexSet, pixel_count: usize) -> Result<LandCoverAnalysis> {
    if pixel_count == 0 || indices.values().all(|series| series.valid_count() == 0) {
        return Err(AnalysisError::InsufficientData);
    }

    let pixel_categories: Vec<LandCoverCategory> = (0..pixel_count)
        .into_par_iter()
        .map(|i| classify_pixel(&PixelIndices::at(indices, i)))
        .collect();

    let mut counts: BTreeMap<LandCoverCategory, usize> =
        LandCoverCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for category in &pixel_categories {
        *counts.entry(*category).or_insert(0) += 1;
    }

    // Strictly greater keeps the earliest category on ties
    let mut dominant = LandCoverCategory::ALL[0];
    for category in LandCoverCategory::ALL {
        if counts[&category] > counts[&dominant] {
            dominant = category;
        }
    }

    let land_cover_stats = counts
        .iter()
        .map(|(category, count)| {
            let share = CategoryShare {
                percentage: *count as f64 / pixel_count as f64 * 100.0,
                color: category.color().to_string(),
                pixel_count: *count,
            };
            (*category, share)
        })
        .collect();

    debug!(pixels = pixel_count, dominant = %dominant, "Classified land cover");

    Ok(LandCoverAnalysis {
        land_cover_stats,
        dominant_land_cover: dominant,
        total_pixels: pixel_count,
        pixel_categories,
    })
}
