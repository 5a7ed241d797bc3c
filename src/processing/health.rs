// src/processing/health.rs
//! Crop and soil health zones.
//!
//! Overall health = ndvi_weight * vegetation + water_weight * water
//! + environment_weight * environment, each signal in [0, 1]:
//! - vegetation: NDVI mean relative to the crop's healthy baseline
//! - water: NDWI mean (MNDWI when NDWI is unavailable) ramped between the
//!   configured floor and ceiling
//! - environment: mean comfort of temperature, humidity and soil moisture

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::classify::PixelIndices;
use super::indices::{IndexSet, SpectralIndex};
use super::statistics::{IndexStatistics, IndexSummary};
use crate::bands::{CropBaseline, ResolvedEnvironment};
use crate::config::{ramp, HealthModel};
use crate::error::{AnalysisError, Result};

/// Neutral water signal when neither NDWI nor MNDWI has statistics
pub const NEUTRAL_WATER_SIGNAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthZone {
    HeatStressed,
    WaterStressed,
    VegetationStressed,
    WellIrrigated,
    Nominal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CropHealthClass {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl CropHealthClass {
    fn weight(&self) -> f64 {
        match self {
            CropHealthClass::Excellent => 1.0,
            CropHealthClass::Good => 0.75,
            CropHealthClass::Moderate => 0.5,
            CropHealthClass::Poor => 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilHealthClass {
    Healthy,
    Moderate,
    Degraded,
}

impl SoilHealthClass {
    fn weight(&self) -> f64 {
        match self {
            SoilHealthClass::Healthy => 1.0,
            SoilHealthClass::Moderate => 0.6,
            SoilHealthClass::Degraded => 0.2,
        }
    }
}

/// Where the water signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterSource {
    Ndwi,
    Mndwi,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSignals {
    pub vegetation: f64,
    pub water: f64,
    pub water_source: WaterSource,
    pub environment: f64,
    pub temperature_comfort: f64,
    pub humidity_comfort: f64,
    pub soil_moisture_comfort: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropHealth {
    pub overall_score: f64,
    pub dominant_zone: HealthZone,
    pub signals: HealthSignals,
    /// Weighted score of the per-pixel classes
    pub pixel_score: f64,
    pub statistics: BTreeMap<CropHealthClass, usize>,
    pub dominant_class: CropHealthClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilHealth {
    pub overall_score: f64,
    pub dominant_zone: SoilHealthClass,
    pub statistics: BTreeMap<SoilHealthClass, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUniformity {
    pub crop_variability: f64,
    pub soil_variability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthZones {
    pub crop_health: CropHealth,
    pub soil_health: SoilHealth,
    pub field_uniformity: FieldUniformity,
}

/// Inputs of the dominant-zone decision list
#[derive(Debug, Clone, Copy)]
pub struct ZoneInputs {
    pub health: f64,
    pub vegetation: f64,
    pub water: f64,
    pub temperature: f64,
    pub soil_moisture: f64,
}

pub struct ZoneRule {
    pub zone: HealthZone,
    pub matches: fn(&ZoneInputs, &HealthModel) -> bool,
}

fn is_heat_stressed(z: &ZoneInputs, m: &HealthModel) -> bool {
    z.temperature > m.heat_stress_temperature
}

fn is_water_stressed(z: &ZoneInputs, m: &HealthModel) -> bool {
    z.water < m.water_stress_signal || z.soil_moisture < m.dry_soil_moisture
}

fn is_vegetation_stressed(z: &ZoneInputs, m: &HealthModel) -> bool {
    z.health < m.vegetation_stress_health
}

fn is_well_irrigated(z: &ZoneInputs, m: &HealthModel) -> bool {
    z.water >= m.well_irrigated_signal && z.health >= m.well_irrigated_health
}

fn always(_: &ZoneInputs, _: &HealthModel) -> bool {
    true
}

/// Dominant-zone rules, first match wins. The last rule always matches.
pub const ZONE_RULES: &[ZoneRule] = &[
    ZoneRule {
        zone: HealthZone::HeatStressed,
        matches: is_heat_stressed,
    },
    ZoneRule {
        zone: HealthZone::WaterStressed,
        matches: is_water_stressed,
    },
    ZoneRule {
        zone: HealthZone::VegetationStressed,
        matches: is_vegetation_stressed,
    },
    ZoneRule {
        zone: HealthZone::WellIrrigated,
        matches: is_well_irrigated,
    },
    ZoneRule {
        zone: HealthZone::Nominal,
        matches: always,
    },
];

pub fn dominant_zone(inputs: &ZoneInputs, model: &HealthModel) -> HealthZone {
    ZONE_RULES
        .iter()
        .find(|rule| (rule.matches)(inputs, model))
        .map(|rule| rule.zone)
        .unwrap_or(HealthZone::Nominal)
}

/// NDVI statistics, or `InsufficientSignal` when they are missing
pub fn ndvi_statistics(summaries: &BTreeMap<SpectralIndex, IndexSummary>) -> Result<&IndexStatistics> {
    summaries
        .get(&SpectralIndex::Ndvi)
        .and_then(IndexSummary::statistics)
        .ok_or(AnalysisError::InsufficientSignal)
}

/// Water signal in [0, 1] and its source
pub fn water_signal(
    summaries: &BTreeMap<SpectralIndex, IndexSummary>,
    model: &HealthModel,
) -> (f64, WaterSource) {
    let mean = |index| {
        summaries
            .get(&index)
            .and_then(IndexSummary::statistics)
            .map(|s| s.mean)
    };
    match (mean(SpectralIndex::Ndwi), mean(SpectralIndex::Mndwi)) {
        (Some(ndwi), _) => (
            ramp(ndwi, model.water_floor_ndwi, model.water_ceiling_ndwi),
            WaterSource::Ndwi,
        ),
        (None, Some(mndwi)) => (
            ramp(mndwi, model.water_floor_ndwi, model.water_ceiling_ndwi),
            WaterSource::Mndwi,
        ),
        (None, None) => (NEUTRAL_WATER_SIGNAL, WaterSource::Unavailable),
    }
}

pub fn classify_crop_pixel(pixel: &PixelIndices, baseline: &CropBaseline) -> Option<CropHealthClass> {
    let ndvi = pixel.ndvi?;
    let ndwi_above = |t: f64| pixel.ndwi.map_or(true, |w| w > t);

    let class = if ndvi > baseline.healthy_ndvi && ndwi_above(0.3) {
        CropHealthClass::Excellent
    } else if ndvi > 0.5 && ndwi_above(0.2) {
        CropHealthClass::Good
    } else if ndvi > 0.3 && ndwi_above(0.1) {
        CropHealthClass::Moderate
    } else {
        CropHealthClass::Poor
    };
    Some(class)
}

pub fn classify_soil_pixel(pixel: &PixelIndices) -> Option<SoilHealthClass> {
    let ndvi = pixel.ndvi?;
    let class = match pixel.ndsi {
        Some(ndsi) if ndsi > 0.4 && ndvi < 0.3 => SoilHealthClass::Degraded,
        Some(ndsi) if ndsi > 0.2 && ndsi < 0.4 && ndvi > 0.3 && ndvi < 0.6 => {
            SoilHealthClass::Moderate
        }
        _ => SoilHealthClass::Healthy,
    };
    Some(class)
}

/// Score health zones. Requires NDVI statistics; everything else is optional.
pub fn score_health(
    summaries: &BTreeMap<SpectralIndex, IndexSummary>,
    indices: &IndexSet,
    pixel_count: usize,
    environment: &ResolvedEnvironment,
    baseline: &CropBaseline,
    model: &HealthModel,
) -> Result<HealthZones> {
    let ndvi = ndvi_statistics(summaries)?;

    let vegetation = if baseline.healthy_ndvi > 0.0 {
        (ndvi.mean / baseline.healthy_ndvi).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (water, water_source) = water_signal(summaries, model);

    let temperature_comfort = model.temperature_comfort.score(environment.temperature);
    let humidity_comfort = model.humidity_comfort.score(environment.humidity);
    let soil_moisture_comfort = model.soil_moisture_comfort.score(environment.soil_moisture);
    let env_signal = (temperature_comfort + humidity_comfort + soil_moisture_comfort) / 3.0;

    let overall_score = (model.ndvi_weight * vegetation
        + model.water_weight * water
        + model.environment_weight * env_signal)
        .clamp(0.0, 1.0);

    let zone = dominant_zone(
        &ZoneInputs {
            health: overall_score,
            vegetation,
            water,
            temperature: environment.temperature,
            soil_moisture: environment.soil_moisture,
        },
        model,
    );

    let mut crop_counts: BTreeMap<CropHealthClass, usize> = BTreeMap::new();
    let mut soil_counts: BTreeMap<SoilHealthClass, usize> = BTreeMap::new();
    for i in 0..pixel_count {
        let pixel = PixelIndices::at(indices, i);
        if let Some(class) = classify_crop_pixel(&pixel, baseline) {
            *crop_counts.entry(class).or_insert(0) += 1;
        }
        if let Some(class) = classify_soil_pixel(&pixel) {
            *soil_counts.entry(class).or_insert(0) += 1;
        }
    }

    let crop_total: usize = crop_counts.values().sum();
    let soil_total: usize = soil_counts.values().sum();

    debug!(
        overall_score,
        vegetation,
        water,
        environment = env_signal,
        zone = ?zone,
        "Scored crop health"
    );

    Ok(HealthZones {
        crop_health: CropHealth {
            overall_score,
            dominant_zone: zone,
            signals: HealthSignals {
                vegetation,
                water,
                water_source,
                environment: env_signal,
                temperature_comfort,
                humidity_comfort,
                soil_moisture_comfort,
            },
            pixel_score: weighted_share(&crop_counts, CropHealthClass::weight),
            dominant_class: most_common(&crop_counts).unwrap_or(CropHealthClass::Poor),
            statistics: crop_counts.clone(),
        },
        soil_health: SoilHealth {
            overall_score: weighted_share(&soil_counts, SoilHealthClass::weight),
            dominant_zone: most_common(&soil_counts).unwrap_or(SoilHealthClass::Healthy),
            statistics: soil_counts.clone(),
        },
        field_uniformity: FieldUniformity {
            crop_variability: variability(crop_counts.len(), crop_total),
            soil_variability: variability(soil_counts.len(), soil_total),
        },
    })
}

fn weighted_share<K: Ord>(counts: &BTreeMap<K, usize>, weight: fn(&K) -> f64) -> f64 {
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let weighted: f64 = counts.iter().map(|(k, n)| weight(k) * *n as f64).sum();
    weighted / total as f64
}

/// Most frequent key; ties go to the first key in order
fn most_common<K: Ord + Copy>(counts: &BTreeMap<K, usize>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (k, n) in counts {
        if best.map_or(true, |(_, m)| *n > m) {
            best = Some((*k, *n));
        }
    }
    best.map(|(k, _)| k)
}

fn variability(distinct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        distinct as f64 / total as f64
    }
}
