// src/bands.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config;
use crate::error::{AnalysisError, Result};

/// Spectral bands accepted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Red,
    Green,
    /// Near-infrared
    Nir,
    /// Shortwave-infrared
    Swir,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::Red, Band::Green, Band::Nir, Band::Swir];

    pub fn name(&self) -> &'static str {
        match self {
            Band::Red => "red",
            Band::Green => "green",
            Band::Nir => "nir",
            Band::Swir => "swir",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Band {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "red" => Ok(Band::Red),
            "green" => Ok(Band::Green),
            "nir" | "near_infrared" => Ok(Band::Nir),
            "swir" | "shortwave_infrared" => Ok(Band::Swir),
            _ => Err(AnalysisError::UnknownBand(s.to_string())),
        }
    }
}

/// Reflectance arrays for one analysis, all of the same non-zero length
#[derive(Debug, Clone)]
pub struct BandSet {
    bands: BTreeMap<Band, Vec<f64>>,
    pixel_count: usize,
}

impl BandSet {
    /// Validate band arrays. Fails before any index work when a band is
    /// empty or the lengths disagree.
    pub fn new(bands: BTreeMap<Band, Vec<f64>>) -> Result<Self> {
        let mut expected: Option<usize> = None;

        for (band, values) in &bands {
            if values.is_empty() {
                return Err(AnalysisError::EmptyBand(*band));
            }
            match expected {
                None => expected = Some(values.len()),
                Some(len) if len != values.len() => {
                    return Err(AnalysisError::DimensionMismatch {
                        band: *band,
                        expected: len,
                        actual: values.len(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            bands,
            pixel_count: expected.unwrap_or(0),
        })
    }

    /// Build from loosely named arrays (`"red"`, `"NIR"`, ...). Names that are
    /// not one of the four supported bands are skipped and returned.
    pub fn from_named(named: &BTreeMap<String, Vec<f64>>) -> Result<(Self, Vec<String>)> {
        let mut bands = BTreeMap::new();
        let mut ignored = Vec::new();

        for (name, values) in named {
            match name.parse::<Band>() {
                Ok(band) => {
                    bands.insert(band, values.clone());
                }
                Err(_) => {
                    warn!(band = %name, "Ignoring unsupported band");
                    ignored.push(name.clone());
                }
            }
        }

        Ok((Self::new(bands)?, ignored))
    }

    pub fn get(&self, band: Band) -> Option<&[f64]> {
        self.bands.get(&band).map(Vec::as_slice)
    }

    pub fn contains(&self, band: Band) -> bool {
        self.bands.contains_key(&band)
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Ambient readings for the whole field, each optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Air temperature in °C
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Relative humidity in %
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Volumetric soil moisture in %
    #[serde(default)]
    pub soil_moisture: Option<f64>,
}

impl Environment {
    /// Fill missing readings with neutral values.
    pub fn resolve(&self) -> ResolvedEnvironment {
        let mut defaulted = Vec::new();
        let mut pick = |value: Option<f64>, neutral: f64, name: &'static str| {
            value.unwrap_or_else(|| {
                defaulted.push(name.to_string());
                neutral
            })
        };

        let temperature = pick(self.temperature, config::NEUTRAL_TEMPERATURE_C, "temperature");
        let humidity = pick(self.humidity, config::NEUTRAL_HUMIDITY_PCT, "humidity");
        let soil_moisture = pick(
            self.soil_moisture,
            config::NEUTRAL_SOIL_MOISTURE_PCT,
            "soil_moisture",
        );

        ResolvedEnvironment {
            temperature,
            humidity,
            soil_moisture,
            defaulted,
        }
    }

    /// Apply per-field overrides on top of these readings.
    pub fn merged_with(&self, overrides: &Environment) -> Environment {
        Environment {
            temperature: overrides.temperature.or(self.temperature),
            humidity: overrides.humidity.or(self.humidity),
            soil_moisture: overrides.soil_moisture.or(self.soil_moisture),
        }
    }
}

/// Environment with every reading present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEnvironment {
    pub temperature: f64,
    pub humidity: f64,
    pub soil_moisture: f64,
    /// Readings that were absent and replaced by neutral values
    pub defaulted: Vec<String>,
}

/// Crop families with their own healthy NDVI baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropType {
    Rice,
    Wheat,
    Cotton,
    Sugarcane,
    Maize,
    Generic,
}

impl CropType {
    /// Resolve a crop identifier; `None` for identifiers without a baseline.
    pub fn from_identifier(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "rice" | "paddy" => Some(CropType::Rice),
            "wheat" => Some(CropType::Wheat),
            "cotton" => Some(CropType::Cotton),
            "sugarcane" => Some(CropType::Sugarcane),
            "maize" | "corn" => Some(CropType::Maize),
            "" | "general" | "generic" => Some(CropType::Generic),
            _ => None,
        }
    }

    pub fn baseline(&self) -> CropBaseline {
        let (healthy_ndvi, stress_threshold) = match self {
            CropType::Rice => (0.80, 0.15),
            CropType::Wheat => (0.70, 0.12),
            CropType::Cotton => (0.75, 0.18),
            CropType::Sugarcane => (0.85, 0.20),
            CropType::Maize => (0.70, 0.15),
            CropType::Generic => (config::GENERIC_HEALTHY_NDVI, config::GENERIC_STRESS_THRESHOLD),
        };
        CropBaseline {
            healthy_ndvi,
            stress_threshold,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CropType::Rice => "rice",
            CropType::Wheat => "wheat",
            CropType::Cotton => "cotton",
            CropType::Sugarcane => "sugarcane",
            CropType::Maize => "maize",
            CropType::Generic => "generic",
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// NDVI expectations for a healthy stand of a crop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropBaseline {
    pub healthy_ndvi: f64,
    /// NDVI drop below the baseline considered stress
    pub stress_threshold: f64,
}
