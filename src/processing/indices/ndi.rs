// src/processing/indices/ndi.rs
use rayon::prelude::*;

use super::{IndexCalculator, IndexValue};
use crate::bands::{Band, BandSet};
use crate::config::DENOMINATOR_EPSILON;

/// Normalized Difference Index (NDI) calculator: (A - B) / (A + B)
pub struct NDI {
    band_a: Band,
    band_b: Band,
    name: String,
}

impl NDI {
    pub fn new(band_a: Band, band_b: Band, name: Option<String>) -> Self {
        Self {
            band_a,
            band_b,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }
}

/// Normalized difference of one pixel. A sum within epsilon of zero, or a
/// non-finite result, is invalid. Out-of-range results are passed through.
pub fn normalized_difference(a: f64, b: f64) -> IndexValue {
    let sum = a + b;
    if !sum.is_finite() || sum.abs() < DENOMINATOR_EPSILON {
        return IndexValue::Invalid;
    }
    let value = (a - b) / sum;
    if value.is_finite() {
        IndexValue::Valid(value)
    } else {
        IndexValue::Invalid
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, bands: &BandSet) -> Option<Vec<IndexValue>> {
        let a_data = bands.get(self.band_a)?;
        let b_data = bands.get(self.band_b)?;

        // BandSet guarantees equal lengths
        let result = a_data
            .par_iter()
            .zip(b_data.par_iter())
            .map(|(&a, &b)| normalized_difference(a, b))
            .collect();

        Some(result)
    }

    fn required_bands(&self) -> [Band; 2] {
        [self.band_a, self.band_b]
    }

    fn name(&self) -> &str {
        &self.name
    }
}
