// src/processing/recommend.rs
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use super::health::{HealthZone, HealthZones};
use super::pest::{PestAssessment, RiskLevel};
use crate::bands::ResolvedEnvironment;
use crate::config::ScoringConfig;

const CRITICAL_CROP_HEALTH: f64 = 0.4;
const LOW_CROP_HEALTH: f64 = 0.6;
const LOW_SOIL_HEALTH: f64 = 0.4;
const MAX_PESTS_NAMED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    CropHealth,
    Irrigation,
    Drainage,
    HeatStress,
    PestControl,
    SpecificPests,
    SoilHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub actions: Vec<String>,
}

impl Recommendation {
    fn new(
        kind: RecommendationKind,
        priority: Priority,
        title: impl Into<String>,
        description: impl Into<String>,
        actions: &[&str],
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            priority,
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Rule-matched recommendations: at most one per kind, highest priority
/// first, insertion order kept within a priority.
pub fn recommend(
    health: &HealthZones,
    pest: &PestAssessment,
    environment: &ResolvedEnvironment,
    config: &ScoringConfig,
) -> Vec<Recommendation> {
    let model = &config.health;
    let crop = &health.crop_health;
    let mut out = Vec::new();

    if crop.overall_score < CRITICAL_CROP_HEALTH {
        out.push(Recommendation::new(
            RecommendationKind::CropHealth,
            Priority::High,
            "Crop Health Critical",
            "Crop health is below optimal levels. Consider soil testing and nutrient management.",
            &["Soil nutrient analysis", "Fertilizer application", "Irrigation assessment"],
        ));
    } else if crop.overall_score < LOW_CROP_HEALTH {
        out.push(Recommendation::new(
            RecommendationKind::CropHealth,
            Priority::Medium,
            "Improve Crop Health",
            "Moderate crop stress detected. Monitor and optimize growing conditions.",
            &["Monitor water stress", "Adjust fertilization", "Check for early pest signs"],
        ));
    }

    let dry_soil = environment.soil_moisture < model.dry_soil_moisture;
    if crop.dominant_zone == HealthZone::WaterStressed
        || crop.signals.water < model.water_stress_signal
        || dry_soil
    {
        out.push(Recommendation::new(
            RecommendationKind::Irrigation,
            if dry_soil { Priority::High } else { Priority::Medium },
            "Irrigation Required",
            format!(
                "Water stress detected (water signal {:.2}, soil moisture {:.0} %).",
                crop.signals.water, environment.soil_moisture
            ),
            &[
                "Schedule irrigation",
                "Check irrigation system uniformity",
                "Mulch to reduce evaporation",
            ],
        ));
    }

    if environment.soil_moisture > model.soil_moisture_comfort.optimum_high
        && crop.signals.soil_moisture_comfort < 0.5
    {
        out.push(Recommendation::new(
            RecommendationKind::Drainage,
            Priority::Medium,
            "Excess Soil Moisture",
            format!(
                "Soil moisture of {:.0} % risks waterlogging and root disease.",
                environment.soil_moisture
            ),
            &["Inspect field drainage", "Pause irrigation", "Watch for root rot"],
        ));
    }

    if crop.dominant_zone == HealthZone::HeatStressed {
        out.push(Recommendation::new(
            RecommendationKind::HeatStress,
            Priority::High,
            "Heat Stress Detected",
            format!(
                "Temperature of {:.1} °C exceeds the heat stress threshold.",
                environment.temperature
            ),
            &[
                "Irrigate during cooler hours",
                "Consider shade or anti-transpirant sprays",
                "Monitor for wilting",
            ],
        ));
    }

    match pest.risk_level {
        RiskLevel::High => out.push(Recommendation::new(
            RecommendationKind::PestControl,
            Priority::High,
            "High Pest Risk Detected",
            "Environmental conditions favor pest development. Implement preventive measures.",
            &[
                "Implement intensive field monitoring (2-3 times per week)",
                "Consider preventive pest control measures",
                "Monitor weather conditions for pest-favorable periods",
            ],
        )),
        RiskLevel::Medium => out.push(Recommendation::new(
            RecommendationKind::PestControl,
            Priority::Medium,
            "Moderate Pest Risk",
            "Some conditions favor pests. Keep up regular scouting.",
            &[
                "Regular field scouting (weekly)",
                "Maintain field hygiene and remove crop residues",
                "Monitor threshold levels for economic pests",
            ],
        )),
        RiskLevel::Low => {}
    }

    let alerts: Vec<&str> = pest
        .specific_pests
        .iter()
        .filter(|p| p.risk > config.pest.specific_pest_alert)
        .sorted_by(|a, b| b.risk.total_cmp(&a.risk))
        .take(MAX_PESTS_NAMED)
        .map(|p| p.name.as_str())
        .collect();
    if !alerts.is_empty() {
        let actions: Vec<String> = alerts.iter().map(|p| format!("Monitor for {p}")).collect();
        out.push(Recommendation {
            kind: RecommendationKind::SpecificPests,
            title: format!("High Risk: {}", alerts.join(", ")),
            description: format!("Specific pest risks identified for {}.", pest.crop_type),
            priority: Priority::High,
            actions,
        });
    }

    if health.soil_health.overall_score < LOW_SOIL_HEALTH {
        out.push(Recommendation::new(
            RecommendationKind::SoilHealth,
            Priority::Medium,
            "Soil Health Improvement Needed",
            "Soil conditions show signs of degradation or poor coverage.",
            &[
                "Soil organic matter enhancement",
                "Cover crop consideration",
                "Erosion control measures",
            ],
        ));
    }

    let mut ranked: Vec<Recommendation> = out
        .into_iter()
        .unique_by(|r| r.kind)
        .sorted_by(|a, b| b.priority.cmp(&a.priority))
        .collect();

    if ranked.len() > config.max_recommendations {
        let dropped: Vec<RecommendationKind> = ranked[config.max_recommendations..]
            .iter()
            .map(|r| r.kind)
            .collect();
        debug!(
            cap = config.max_recommendations,
            ?dropped,
            "Recommendations beyond the cap dropped"
        );
        ranked.truncate(config.max_recommendations);
    }
    ranked
}
