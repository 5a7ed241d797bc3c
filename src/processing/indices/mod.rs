// src/processing/indices/mod.rs
pub mod ndi;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bands::{Band, BandSet};

pub use ndi::NDI;

/// Computes one index per pixel from a validated band set
pub trait IndexCalculator: Send + Sync {
    /// Per-pixel values, or `None` when a required band is absent
    fn calculate(&self, bands: &BandSet) -> Option<Vec<IndexValue>>;

    /// Bands read by this calculator
    fn required_bands(&self) -> [Band; 2];

    /// Return the name of the index
    fn name(&self) -> &str;
}

/// Normalized-difference indices derived by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpectralIndex {
    /// Vegetation: (NIR - Red) / (NIR + Red)
    #[serde(rename = "NDVI")]
    Ndvi,
    /// Water content: (NIR - SWIR) / (NIR + SWIR)
    #[serde(rename = "NDWI")]
    Ndwi,
    /// Open water: (Green - SWIR) / (Green + SWIR)
    #[serde(rename = "MNDWI")]
    Mndwi,
    /// Snow and ice: (Green - SWIR) / (Green + SWIR)
    #[serde(rename = "NDSI")]
    Ndsi,
}

impl SpectralIndex {
    pub const ALL: [SpectralIndex; 4] = [
        SpectralIndex::Ndvi,
        SpectralIndex::Ndwi,
        SpectralIndex::Mndwi,
        SpectralIndex::Ndsi,
    ];

    /// (bandA, bandB) of the normalized difference
    pub fn bands(&self) -> (Band, Band) {
        match self {
            SpectralIndex::Ndvi => (Band::Nir, Band::Red),
            SpectralIndex::Ndwi => (Band::Nir, Band::Swir),
            SpectralIndex::Mndwi => (Band::Green, Band::Swir),
            SpectralIndex::Ndsi => (Band::Green, Band::Swir),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpectralIndex::Ndvi => "NDVI",
            SpectralIndex::Ndwi => "NDWI",
            SpectralIndex::Mndwi => "MNDWI",
            SpectralIndex::Ndsi => "NDSI",
        }
    }

    pub fn calculator(&self) -> NDI {
        let (a, b) = self.bands();
        NDI::new(a, b, Some(self.name().to_string()))
    }
}

impl fmt::Display for SpectralIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One pixel of an index
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexValue {
    Valid(f64),
    /// Zero denominator or non-finite input
    Invalid,
}

impl IndexValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            IndexValue::Valid(v) => Some(*v),
            IndexValue::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, IndexValue::Valid(_))
    }
}

/// Per-pixel values of one index, one entry per input pixel
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSeries {
    index: SpectralIndex,
    values: Vec<IndexValue>,
}

impl IndexSeries {
    pub fn new(index: SpectralIndex, values: Vec<IndexValue>) -> Self {
        Self { index, values }
    }

    pub fn index(&self) -> SpectralIndex {
        self.index
    }

    pub fn values(&self) -> &[IndexValue] {
        &self.values
    }

    /// Value at pixel `i`; out of range reads as invalid
    pub fn get(&self, i: usize) -> IndexValue {
        self.values.get(i).copied().unwrap_or(IndexValue::Invalid)
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(IndexValue::value)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_valid()).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Every index that could be computed, keyed in enumeration order
pub type IndexSet = BTreeMap<SpectralIndex, IndexSeries>;

/// Compute every index whose bands are present. Indices with a missing band
/// are omitted rather than defaulted.
pub fn compute_indices(bands: &BandSet) -> IndexSet {
    let mut set = IndexSet::new();

    for index in SpectralIndex::ALL {
        let calculator = index.calculator();
        match calculator.calculate(bands) {
            Some(values) => {
                let series = IndexSeries::new(index, values);
                debug!(
                    index = calculator.name(),
                    pixels = series.len(),
                    valid = series.valid_count(),
                    "Computed index"
                );
                set.insert(index, series);
            }
            None => {
                debug!(
                    index = calculator.name(),
                    required = ?calculator.required_bands(),
                    "Skipping index, band missing"
                );
            }
        }
    }

    set
}
