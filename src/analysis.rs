// src/analysis.rs
//! End-to-end field analysis: bands in, one [`AnalysisResult`] out.
//!
//! Structural failures (band length mismatch, empty band, nothing computable)
//! abort the analysis. Stage-local gaps are recorded in `diagnostics`: an
//! index without valid samples is reported as such and skipped downstream,
//! and without NDVI the health, pest and recommendation stages are omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bands::{BandSet, CropType, Environment, ResolvedEnvironment};
use crate::config::ScoringConfig;
use crate::error::Result;
use crate::processing::classify::{self, LandCoverAnalysis, LandCoverCategory};
use crate::processing::health::{self, HealthZones};
use crate::processing::indices::{self, IndexSet, SpectralIndex};
use crate::processing::interpret::{self, Interpretation};
use crate::processing::pest::{self, PestAssessment};
use crate::processing::quality;
use crate::processing::recommend::{self, Recommendation};
use crate::processing::statistics::{self, IndexSummary};
use crate::processing::trend::{self, NdviTrend};

/// Everything the engine needs for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Band name (`red`, `green`, `nir`, `swir`) to reflectance values
    pub bands: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub crop_type: Option<String>,
    /// Earlier NDVI means, oldest first
    #[serde(default)]
    pub ndvi_history: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_pixels_analyzed: usize,
    pub indices_calculated: Vec<SpectralIndex>,
    pub dominant_land_cover: LandCoverCategory,
    pub crop_type: CropType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub indices_stats: BTreeMap<SpectralIndex, IndexSummary>,
    pub land_cover_analysis: LandCoverAnalysis,
    pub interpretations: BTreeMap<SpectralIndex, Interpretation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_zones: Option<HealthZones>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pest_assessment: Option<PestAssessment>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndvi_trend: Option<NdviTrend>,
    pub environment: ResolvedEnvironment,
    pub summary: Summary,
    pub diagnostics: Vec<String>,
    /// Per-pixel index values
    #[serde(skip)]
    pub indices: IndexSet,
}

/// Health, pest and recommendation stages together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAssessment {
    pub health_zones: HealthZones,
    pub pest_assessment: PestAssessment,
    pub recommendations: Vec<Recommendation>,
}

/// Score crop health and pest risk from already computed indices. Fails
/// with `InsufficientSignal` when NDVI statistics are unavailable.
pub fn assess_field(
    summaries: &BTreeMap<SpectralIndex, IndexSummary>,
    indices: &IndexSet,
    pixel_count: usize,
    environment: &ResolvedEnvironment,
    crop: CropType,
    config: &ScoringConfig,
) -> Result<FieldAssessment> {
    let baseline = crop.baseline();
    let health_zones = health::score_health(
        summaries,
        indices,
        pixel_count,
        environment,
        &baseline,
        &config.health,
    )?;
    let pest_assessment = pest::assess_pest_risk(summaries, environment, crop, &config.pest)?;
    let recommendations =
        recommend::recommend(&health_zones, &pest_assessment, environment, config);

    Ok(FieldAssessment {
        health_zones,
        pest_assessment,
        recommendations,
    })
}

/// Run the full analysis for one field.
pub fn analyze(request: &AnalysisRequest, config: &ScoringConfig) -> Result<AnalysisResult> {
    config.validate()?;
    let mut diagnostics = Vec::new();

    let (bands, ignored) = BandSet::from_named(&request.bands)?;
    for name in ignored {
        diagnostics.push(format!("Band '{name}' is not used by the engine and was ignored"));
    }
    let pixel_count = bands.pixel_count();

    let crop = match request.crop_type.as_deref() {
        None => CropType::Generic,
        Some(id) => CropType::from_identifier(id).unwrap_or_else(|| {
            diagnostics.push(format!(
                "No baseline for crop type '{id}', using the generic baseline"
            ));
            CropType::Generic
        }),
    };

    let indices = indices::compute_indices(&bands);
    let summaries = statistics::summarize_all(&indices);

    for (index, summary) in &summaries {
        if let IndexSummary::NoValidSamples { total_pixels } = summary {
            warn!(index = %index, "No valid samples");
            diagnostics.push(format!(
                "{index}: no valid samples in {total_pixels} pixels, omitted from interpretation"
            ));
        }
        if let Some(series) = indices.get(index) {
            diagnostics.extend(quality::assess(series, summary.statistics()));
        }
    }
    for index in SpectralIndex::ALL {
        if !indices.contains_key(&index) {
            let (a, b) = index.bands();
            diagnostics.push(format!("{index}: not computed, requires {a} and {b} bands"));
        }
    }

    let land_cover = classify::classify(&indices, pixel_count)?;
    let interpretations = interpret::interpret_all(&summaries, land_cover.dominant_land_cover);

    let environment = request.environment.resolve();
    if !environment.defaulted.is_empty() {
        diagnostics.push(format!(
            "Environmental readings missing, neutral values used for: {}",
            environment.defaulted.join(", ")
        ));
    }

    let (health_zones, pest_assessment, recommendations) = match assess_field(
        &summaries,
        &indices,
        pixel_count,
        &environment,
        crop,
        config,
    ) {
        Ok(assessment) => (
            Some(assessment.health_zones),
            Some(assessment.pest_assessment),
            assessment.recommendations,
        ),
        Err(e) => {
            warn!(error = %e, "Skipping health and pest scoring");
            diagnostics.push(e.to_string());
            (None, None, Vec::new())
        }
    };

    let ndvi_trend = request.ndvi_history.as_deref().map(trend::analyze_trend);

    let summary = Summary {
        total_pixels_analyzed: pixel_count,
        indices_calculated: indices.keys().copied().collect(),
        dominant_land_cover: land_cover.dominant_land_cover,
        crop_type: crop,
    };

    info!(
        pixels = pixel_count,
        indices = indices.len(),
        dominant = %land_cover.dominant_land_cover,
        "Analysis complete"
    );

    Ok(AnalysisResult {
        indices_stats: summaries,
        land_cover_analysis: land_cover,
        interpretations,
        health_zones,
        pest_assessment,
        recommendations,
        ndvi_trend,
        environment,
        summary,
        diagnostics,
        indices,
    })
}
