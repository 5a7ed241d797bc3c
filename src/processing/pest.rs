// src/processing/pest.rs
//! Pest risk from spectral stress and weather.
//!
//! overall = sum(weight * factor) + favorable increment, clamped to [0, 1].
//! Every factor is a clamped ramp that never decreases as its stress input
//! grows, and the increment only switches on, so the score is monotonic in
//! each input taken alone.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::health::ndvi_statistics;
use super::indices::SpectralIndex;
use super::statistics::IndexSummary;
use crate::bands::{CropType, ResolvedEnvironment};
use crate::config::{ramp, PestModel};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64, model: &PestModel) -> Self {
        if score > model.high_above {
            RiskLevel::High
        } else if score >= model.medium_from {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub name: String,
    /// Factor value in [0, 1]
    pub score: f64,
    pub weight: f64,
    /// Share of the overall risk
    pub contribution: f64,
    pub available: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificPestRisk {
    pub name: String,
    pub risk: f64,
    /// Whether current weather favours this pest
    pub favorable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PestAssessment {
    pub risk_level: RiskLevel,
    pub overall_risk: f64,
    pub contributing_factors: Vec<RiskFactor>,
    pub favorable_for_pests: bool,
    pub specific_pests: Vec<SpecificPestRisk>,
    pub crop_type: CropType,
}

/// A pest whose risk is `overall * factor`, with a higher factor under the
/// weather it prefers
struct PestProfile {
    name: &'static str,
    favored_by: fn(f64, f64) -> bool,
    favorable_factor: f64,
    base_factor: f64,
}

const fn pest(
    name: &'static str,
    favored_by: fn(f64, f64) -> bool,
    favorable_factor: f64,
    base_factor: f64,
) -> PestProfile {
    PestProfile {
        name,
        favored_by,
        favorable_factor,
        base_factor,
    }
}

fn never(_: f64, _: f64) -> bool {
    false
}

const RICE_PESTS: &[PestProfile] = &[
    pest("brown_planthopper", |_, h| h > 80.0, 0.9, 0.6),
    pest("rice_blast", |t, h| h > 75.0 && t > 25.0, 0.8, 0.4),
    pest("stem_borer", never, 0.7, 0.7),
    pest("leaf_folder", |t, _| t > 28.0, 0.6, 0.4),
];

const COTTON_PESTS: &[PestProfile] = &[
    pest("bollworm", |t, _| t > 25.0 && t < 35.0, 0.8, 0.5),
    pest("aphids", |_, h| h < 60.0, 0.7, 0.4),
    pest("whitefly", |t, _| t > 30.0, 0.9, 0.6),
    pest("thrips", never, 0.6, 0.6),
];

const WHEAT_PESTS: &[PestProfile] = &[
    pest("rust", |_, h| h > 70.0, 0.8, 0.3),
    pest("aphids", never, 0.7, 0.7),
    pest("termites", |_, h| h < 50.0, 0.5, 0.3),
    pest("army_worm", |t, _| t > 25.0, 0.6, 0.4),
];

const GENERIC_PESTS: &[PestProfile] = &[
    pest("aphids", never, 0.6, 0.6),
    pest("spider_mites", |_, h| h < 50.0, 0.5, 0.3),
    pest("thrips", never, 0.5, 0.5),
    pest("fungal_diseases", |_, h| h > 75.0, 0.7, 0.4),
];

fn pest_profiles(crop: CropType) -> &'static [PestProfile] {
    match crop {
        CropType::Rice => RICE_PESTS,
        CropType::Cotton => COTTON_PESTS,
        CropType::Wheat => WHEAT_PESTS,
        CropType::Sugarcane | CropType::Maize | CropType::Generic => GENERIC_PESTS,
    }
}

/// Assess pest risk. Requires NDVI statistics.
pub fn assess_pest_risk(
    summaries: &BTreeMap<SpectralIndex, IndexSummary>,
    environment: &ResolvedEnvironment,
    crop: CropType,
    model: &PestModel,
) -> Result<PestAssessment> {
    let ndvi = ndvi_statistics(summaries)?;
    let baseline = crop.baseline();
    let ndwi_mean = summaries
        .get(&SpectralIndex::Ndwi)
        .and_then(IndexSummary::statistics)
        .map(|s| s.mean);

    let ndvi_drop = (baseline.healthy_ndvi - ndvi.mean).max(0.0);
    let vegetation_deficit = ramp(ndvi_drop, 0.0, baseline.healthy_ndvi);

    let water_anomaly = ndwi_mean
        .map(|m| {
            let deviation = (m - model.ndwi_optimum).abs() - model.ndwi_tolerance;
            ramp(deviation, 0.0, model.ndwi_anomaly_span)
        })
        .unwrap_or(0.0);

    let heterogeneity = ramp(
        ndvi.std,
        model.ndvi_std_floor,
        model.ndvi_std_floor + model.ndvi_std_span,
    );
    let heat = ramp(environment.temperature, model.heat_ramp.0, model.heat_ramp.1);
    let humidity = ramp(environment.humidity, model.humidity_ramp.0, model.humidity_ramp.1);

    let favorable = environment.temperature > model.favorable_temperature
        && environment.humidity > model.favorable_humidity;

    let mut factors = vec![
        factor(
            "vegetation_deficit",
            vegetation_deficit,
            model.vegetation_deficit_weight,
            true,
            format!(
                "NDVI mean {:.3} against a {} baseline of {:.2}{}",
                ndvi.mean,
                crop,
                baseline.healthy_ndvi,
                if ndvi_drop > baseline.stress_threshold {
                    " (below stress threshold)"
                } else {
                    ""
                }
            ),
        ),
        factor(
            "water_anomaly",
            water_anomaly,
            model.water_anomaly_weight,
            ndwi_mean.is_some(),
            match ndwi_mean {
                Some(m) => format!("NDWI mean {m:.3}, optimum {:.2}", model.ndwi_optimum),
                None => "NDWI unavailable, not scored".to_string(),
            },
        ),
        factor(
            "ndvi_heterogeneity",
            heterogeneity,
            model.heterogeneity_weight,
            true,
            format!("NDVI standard deviation {:.3}", ndvi.std),
        ),
        factor(
            "temperature",
            heat,
            model.heat_weight,
            true,
            format!("{:.1} °C", environment.temperature),
        ),
        factor(
            "humidity",
            humidity,
            model.humidity_weight,
            true,
            format!("{:.0} % relative humidity", environment.humidity),
        ),
    ];

    if favorable {
        factors.push(RiskFactor {
            name: "warm_humid_conditions".to_string(),
            score: 1.0,
            weight: model.favorable_increment,
            contribution: model.favorable_increment,
            available: true,
            description: format!(
                "Temperature above {:.0} °C with humidity above {:.0} %",
                model.favorable_temperature, model.favorable_humidity
            ),
        });
    }

    let overall_risk = factors
        .iter()
        .map(|f| f.contribution)
        .sum::<f64>()
        .clamp(0.0, 1.0);
    let risk_level = RiskLevel::from_score(overall_risk, model);

    let specific_pests = pest_profiles(crop)
        .iter()
        .map(|profile| {
            let favored = (profile.favored_by)(environment.temperature, environment.humidity);
            let factor = if favored {
                profile.favorable_factor
            } else {
                profile.base_factor
            };
            SpecificPestRisk {
                name: profile.name.to_string(),
                risk: overall_risk * factor,
                favorable: favored,
            }
        })
        .collect();

    debug!(overall_risk, level = ?risk_level, favorable, "Assessed pest risk");

    Ok(PestAssessment {
        risk_level,
        overall_risk,
        contributing_factors: factors,
        favorable_for_pests: favorable,
        specific_pests,
        crop_type: crop,
    })
}

fn factor(name: &str, score: f64, weight: f64, available: bool, description: String) -> RiskFactor {
    RiskFactor {
        name: name.to_string(),
        score,
        weight,
        contribution: score * weight,
        available,
        description,
    }
}
