// src/config.rs
//! Calibration constants for the health and pest models.
//!
//! The constants are domain calibration values, not learned parameters. They
//! are gathered into [`ScoringConfig`] so a JSON file can override any subset
//! without touching the scoring code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// |bandA + bandB| below this marks the pixel invalid
pub const DENOMINATOR_EPSILON: f64 = 1e-10;

pub const NEUTRAL_TEMPERATURE_C: f64 = 25.0;
pub const NEUTRAL_HUMIDITY_PCT: f64 = 60.0;
pub const NEUTRAL_SOIL_MOISTURE_PCT: f64 = 35.0;

pub const GENERIC_HEALTHY_NDVI: f64 = 0.70;
pub const GENERIC_STRESS_THRESHOLD: f64 = 0.15;

// Health score weights (sum to 1, NDVI dominant)
pub const HEALTH_NDVI_WEIGHT: f64 = 0.60;
pub const HEALTH_WATER_WEIGHT: f64 = 0.25;
pub const HEALTH_ENVIRONMENT_WEIGHT: f64 = 0.15;

// NDWI mapped linearly onto the [0, 1] water signal
pub const WATER_SIGNAL_FLOOR_NDWI: f64 = -0.1;
pub const WATER_SIGNAL_CEILING_NDWI: f64 = 0.4;

// Dominant zone thresholds
pub const HEAT_STRESS_TEMPERATURE_C: f64 = 35.0;
pub const WATER_STRESS_SIGNAL: f64 = 0.35;
pub const DRY_SOIL_MOISTURE_PCT: f64 = 15.0;
pub const WELL_IRRIGATED_SIGNAL: f64 = 0.70;
pub const WELL_IRRIGATED_HEALTH: f64 = 0.60;
pub const VEGETATION_STRESS_HEALTH: f64 = 0.40;

// Pest risk weights (sum to 1)
pub const PEST_VEGETATION_DEFICIT_WEIGHT: f64 = 0.35;
pub const PEST_WATER_ANOMALY_WEIGHT: f64 = 0.25;
pub const PEST_HETEROGENEITY_WEIGHT: f64 = 0.10;
pub const PEST_HEAT_WEIGHT: f64 = 0.15;
pub const PEST_HUMIDITY_WEIGHT: f64 = 0.15;

pub const NDWI_OPTIMUM: f64 = 0.2;
pub const NDWI_TOLERANCE: f64 = 0.1;
pub const NDWI_ANOMALY_SPAN: f64 = 0.4;

pub const NDVI_STD_FLOOR: f64 = 0.05;
pub const NDVI_STD_SPAN: f64 = 0.15;

pub const PEST_HEAT_RAMP_C: (f64, f64) = (20.0, 35.0);
pub const PEST_HUMIDITY_RAMP_PCT: (f64, f64) = (50.0, 90.0);

// Warm and humid conditions known to favour pests
pub const PEST_FAVORABLE_TEMPERATURE_C: f64 = 28.0;
pub const PEST_FAVORABLE_HUMIDITY_PCT: f64 = 70.0;
pub const PEST_FAVORABLE_INCREMENT: f64 = 0.15;

pub const RISK_MEDIUM_FROM: f64 = 0.33;
pub const RISK_HIGH_ABOVE: f64 = 0.66;

/// Specific pests above this risk get a dedicated recommendation
pub const SPECIFIC_PEST_ALERT: f64 = 0.6;

/// One slot per recommendation kind, so no kind is dropped by default
pub const MAX_RECOMMENDATIONS: usize = 7;

/// Linear ramp of `x` from 0 at `low` to 1 at `high`, clamped.
pub fn ramp(x: f64, low: f64, high: f64) -> f64 {
    if high <= low {
        return if x >= high { 1.0 } else { 0.0 };
    }
    ((x - low) / (high - low)).clamp(0.0, 1.0)
}

/// Trapezoidal comfort curve: 1 inside the optimum, falling to 0 at the limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comfort {
    pub limit_low: f64,
    pub optimum_low: f64,
    pub optimum_high: f64,
    pub limit_high: f64,
}

impl Comfort {
    pub const fn new(limit_low: f64, optimum_low: f64, optimum_high: f64, limit_high: f64) -> Self {
        Self {
            limit_low,
            optimum_low,
            optimum_high,
            limit_high,
        }
    }

    pub fn score(&self, x: f64) -> f64 {
        if x < self.optimum_low {
            ramp(x, self.limit_low, self.optimum_low)
        } else if x > self.optimum_high {
            1.0 - ramp(x, self.optimum_high, self.limit_high)
        } else {
            1.0
        }
    }
}

/// Weights and thresholds of the overall health score and dominant zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthModel {
    pub ndvi_weight: f64,
    pub water_weight: f64,
    pub environment_weight: f64,
    pub water_floor_ndwi: f64,
    pub water_ceiling_ndwi: f64,
    pub temperature_comfort: Comfort,
    pub humidity_comfort: Comfort,
    pub soil_moisture_comfort: Comfort,
    pub heat_stress_temperature: f64,
    pub water_stress_signal: f64,
    pub dry_soil_moisture: f64,
    pub well_irrigated_signal: f64,
    pub well_irrigated_health: f64,
    pub vegetation_stress_health: f64,
}

impl Default for HealthModel {
    fn default() -> Self {
        Self {
            ndvi_weight: HEALTH_NDVI_WEIGHT,
            water_weight: HEALTH_WATER_WEIGHT,
            environment_weight: HEALTH_ENVIRONMENT_WEIGHT,
            water_floor_ndwi: WATER_SIGNAL_FLOOR_NDWI,
            water_ceiling_ndwi: WATER_SIGNAL_CEILING_NDWI,
            temperature_comfort: Comfort::new(5.0, 18.0, 30.0, 40.0),
            humidity_comfort: Comfort::new(10.0, 40.0, 70.0, 100.0),
            soil_moisture_comfort: Comfort::new(5.0, 25.0, 45.0, 80.0),
            heat_stress_temperature: HEAT_STRESS_TEMPERATURE_C,
            water_stress_signal: WATER_STRESS_SIGNAL,
            dry_soil_moisture: DRY_SOIL_MOISTURE_PCT,
            well_irrigated_signal: WELL_IRRIGATED_SIGNAL,
            well_irrigated_health: WELL_IRRIGATED_HEALTH,
            vegetation_stress_health: VEGETATION_STRESS_HEALTH,
        }
    }
}

/// Weights and thresholds of the pest risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PestModel {
    pub vegetation_deficit_weight: f64,
    pub water_anomaly_weight: f64,
    pub heterogeneity_weight: f64,
    pub heat_weight: f64,
    pub humidity_weight: f64,
    pub ndwi_optimum: f64,
    pub ndwi_tolerance: f64,
    pub ndwi_anomaly_span: f64,
    pub ndvi_std_floor: f64,
    pub ndvi_std_span: f64,
    pub heat_ramp: (f64, f64),
    pub humidity_ramp: (f64, f64),
    pub favorable_temperature: f64,
    pub favorable_humidity: f64,
    pub favorable_increment: f64,
    pub medium_from: f64,
    pub high_above: f64,
    pub specific_pest_alert: f64,
}

impl Default for PestModel {
    fn default() -> Self {
        Self {
            vegetation_deficit_weight: PEST_VEGETATION_DEFICIT_WEIGHT,
            water_anomaly_weight: PEST_WATER_ANOMALY_WEIGHT,
            heterogeneity_weight: PEST_HETEROGENEITY_WEIGHT,
            heat_weight: PEST_HEAT_WEIGHT,
            humidity_weight: PEST_HUMIDITY_WEIGHT,
            ndwi_optimum: NDWI_OPTIMUM,
            ndwi_tolerance: NDWI_TOLERANCE,
            ndwi_anomaly_span: NDWI_ANOMALY_SPAN,
            ndvi_std_floor: NDVI_STD_FLOOR,
            ndvi_std_span: NDVI_STD_SPAN,
            heat_ramp: PEST_HEAT_RAMP_C,
            humidity_ramp: PEST_HUMIDITY_RAMP_PCT,
            favorable_temperature: PEST_FAVORABLE_TEMPERATURE_C,
            favorable_humidity: PEST_FAVORABLE_HUMIDITY_PCT,
            favorable_increment: PEST_FAVORABLE_INCREMENT,
            medium_from: RISK_MEDIUM_FROM,
            high_above: RISK_HIGH_ABOVE,
            specific_pest_alert: SPECIFIC_PEST_ALERT,
        }
    }
}

/// Full scoring calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub health: HealthModel,
    #[serde(default)]
    pub pest: PestModel,
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

fn default_max_recommendations() -> usize {
    MAX_RECOMMENDATIONS
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            health: HealthModel::default(),
            pest: PestModel::default(),
            max_recommendations: MAX_RECOMMENDATIONS,
        }
    }
}

impl ScoringConfig {
    /// Read a (possibly partial) configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ScoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let health = [
            self.health.ndvi_weight,
            self.health.water_weight,
            self.health.environment_weight,
        ];
        check_weights("health", &health)?;
        if self.health.ndvi_weight < 0.5 {
            return Err(AnalysisError::Config(format!(
                "health.ndvi_weight must be at least 0.5, got {}",
                self.health.ndvi_weight
            )));
        }

        let pest = [
            self.pest.vegetation_deficit_weight,
            self.pest.water_anomaly_weight,
            self.pest.heterogeneity_weight,
            self.pest.heat_weight,
            self.pest.humidity_weight,
        ];
        check_weights("pest", &pest)?;
        if self.pest.favorable_increment < 0.0 {
            return Err(AnalysisError::Config(
                "pest.favorable_increment must not be negative".to_string(),
            ));
        }
        if self.pest.medium_from >= self.pest.high_above {
            return Err(AnalysisError::Config(format!(
                "pest.medium_from ({}) must be below pest.high_above ({})",
                self.pest.medium_from, self.pest.high_above
            )));
        }
        if self.health.water_ceiling_ndwi <= self.health.water_floor_ndwi {
            return Err(AnalysisError::Config(
                "health.water_ceiling_ndwi must exceed health.water_floor_ndwi".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_weights(model: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| *w < 0.0) {
        return Err(AnalysisError::Config(format!(
            "{model} weights must not be negative: {weights:?}"
        )));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(AnalysisError::Config(format!(
            "{model} weights must sum to 1, got {total}"
        )));
    }
    Ok(())
}
