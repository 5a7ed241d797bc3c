// tests/pipeline_tests.rs
use std::collections::BTreeMap;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use agri_spectral::analysis::{analyze, AnalysisRequest};
use agri_spectral::bands::{Band, CropType, Environment};
use agri_spectral::config::{PestModel, ScoringConfig};
use agri_spectral::error::AnalysisError;
use agri_spectral::processing::classify::LandCoverCategory;
use agri_spectral::processing::health::{score_health, HealthZone, WaterSource};
use agri_spectral::processing::indices::{IndexSet, SpectralIndex};
use agri_spectral::processing::pest::{assess_pest_risk, RiskLevel};
use agri_spectral::processing::recommend::{Priority, RecommendationKind};
use agri_spectral::processing::statistics::{IndexStatistics, IndexSummary, Percentiles};
use agri_spectral::processing::trend::TrendKind;

/// Helper function to build a request from named bands
fn request(bands: &[(&str, Vec<f64>)]) -> AnalysisRequest {
    AnalysisRequest {
        bands: bands
            .iter()
            .map(|(name, values)| (name.to_string(), values.clone()))
            .collect(),
        ..Default::default()
    }
}

fn vegetated_field() -> AnalysisRequest {
    request(&[("nir", vec![0.6, 0.7]), ("red", vec![0.05, 0.06])])
}

fn mixed_field() -> AnalysisRequest {
    request(&[
        ("nir", vec![0.60, 0.02, 0.30, 0.25, 0.10, 0.40, 0.0]),
        ("red", vec![0.05, 0.03, 0.25, 0.20, 0.12, 0.10, 0.0]),
        ("green", vec![0.08, 0.08, 0.20, 0.15, 0.60, 0.10, 0.0]),
        ("swir", vec![0.20, 0.01, 0.35, 0.30, 0.10, 0.15, 0.0]),
    ])
}

fn config() -> ScoringConfig {
    ScoringConfig::default()
}

/// Statistics for a uniform index with the given mean and spread
fn computed(mean: f64, std: f64) -> IndexSummary {
    IndexSummary::Computed(IndexStatistics {
        mean,
        median: mean,
        std,
        min: mean - std,
        max: mean + std,
        count: 100,
        percentiles: Percentiles {
            p25: mean,
            p75: mean,
            p90: mean,
        },
    })
}

fn summaries(ndvi: f64, ndwi: Option<f64>) -> BTreeMap<SpectralIndex, IndexSummary> {
    let mut map = BTreeMap::new();
    map.insert(SpectralIndex::Ndvi, computed(ndvi, 0.05));
    if let Some(ndwi) = ndwi {
        map.insert(SpectralIndex::Ndwi, computed(ndwi, 0.02));
    }
    map
}

#[test]
fn test_dense_vegetation_example() {
    let result = analyze(&vegetated_field(), &config()).unwrap();

    let ndvi: Vec<f64> = result.indices[&SpectralIndex::Ndvi]
        .valid_values()
        .collect();
    assert_abs_diff_eq!(ndvi[0], 0.846, epsilon = 1e-3);
    assert_abs_diff_eq!(ndvi[1], 0.842, epsilon = 1e-3);

    let stats = result.indices_stats[&SpectralIndex::Ndvi].statistics().unwrap();
    assert_abs_diff_eq!(stats.mean, 0.844, epsilon = 1e-3);
    assert_eq!(stats.count, 2);

    assert_eq!(
        result.interpretations[&SpectralIndex::Ndvi].status,
        "Dense vegetation"
    );
    assert_eq!(
        result.land_cover_analysis.dominant_land_cover,
        LandCoverCategory::Vegetation
    );
    assert_eq!(result.summary.total_pixels_analyzed, 2);
    assert_eq!(result.summary.indices_calculated, vec![SpectralIndex::Ndvi]);
    assert_eq!(result.summary.crop_type, CropType::Generic);
}

#[test]
fn test_zero_sum_bands_report_no_valid_samples() {
    let req = request(&[
        ("nir", vec![0.0, 0.0, 0.0]),
        ("swir", vec![0.0, 0.0, 0.0]),
        ("red", vec![0.05, 0.05, 0.05]),
    ]);
    let result = analyze(&req, &config()).unwrap();

    assert_eq!(
        result.indices_stats[&SpectralIndex::Ndwi],
        IndexSummary::NoValidSamples { total_pixels: 3 }
    );
    assert!(!result.interpretations.contains_key(&SpectralIndex::Ndwi));
    assert!(result.interpretations.contains_key(&SpectralIndex::Ndvi));
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.starts_with("NDWI: no valid samples")));

    // NDVI is -1 everywhere, which is a low, non-water signature
    assert_eq!(
        result.land_cover_analysis.dominant_land_cover,
        LandCoverCategory::Urban
    );
}

#[test]
fn test_equal_nir_and_swir_give_zero_ndwi() {
    let req = request(&[("nir", vec![0.5, 0.5]), ("swir", vec![0.5, 0.5])]);
    let result = analyze(&req, &config()).unwrap();

    let stats = result.indices_stats[&SpectralIndex::Ndwi].statistics().unwrap();
    assert_relative_eq!(stats.mean, 0.0);
    assert_eq!(stats.count, 2);
}

#[test]
fn test_dimension_mismatch_aborts() {
    let req = request(&[("red", vec![0.1; 5]), ("nir", vec![0.5; 4])]);

    let err = analyze(&req, &config()).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DimensionMismatch {
            band: Band::Nir,
            expected: 5,
            actual: 4
        }
    ));
}

#[test]
fn test_empty_band_aborts() {
    let req = request(&[("red", Vec::new()), ("nir", Vec::new())]);
    assert!(matches!(
        analyze(&req, &config()),
        Err(AnalysisError::EmptyBand(Band::Red))
    ));
}

#[test]
fn test_nothing_computable_is_insufficient_data() {
    let only_red = request(&[("red", vec![0.1, 0.2])]);
    assert!(matches!(
        analyze(&only_red, &config()),
        Err(AnalysisError::InsufficientData)
    ));

    let unknown = request(&[("blue", vec![0.1, 0.2])]);
    assert!(matches!(
        analyze(&unknown, &config()),
        Err(AnalysisError::InsufficientData)
    ));
}

#[test]
fn test_all_invalid_indices_are_insufficient_data() {
    let zero_sums = request(&[("nir", vec![0.0, 0.0]), ("red", vec![0.0, 0.0])]);
    assert!(matches!(
        analyze(&zero_sums, &config()),
        Err(AnalysisError::InsufficientData)
    ));

    // Every computed index is invalid on every pixel
    let all_zero = request(&[
        ("nir", vec![0.0, 0.0]),
        ("red", vec![0.0, 0.0]),
        ("green", vec![0.0, 0.0]),
        ("swir", vec![0.0, 0.0]),
    ]);
    assert!(matches!(
        analyze(&all_zero, &config()),
        Err(AnalysisError::InsufficientData)
    ));
}

#[test]
fn test_percentages_sum_to_100() {
    let result = analyze(&mixed_field(), &config()).unwrap();
    let stats = &result.land_cover_analysis.land_cover_stats;

    assert_eq!(stats.len(), LandCoverCategory::ALL.len());
    let total: f64 = stats.values().map(|s| s.percentage).sum();
    assert_relative_eq!(total, 100.0, epsilon = 1e-9);

    let pixels: usize = stats.values().map(|s| s.pixel_count).sum();
    assert_eq!(pixels, 7);

    // The all-zero pixel has no valid index
    assert_eq!(stats[&LandCoverCategory::Unclassified].pixel_count, 1);
}

#[test]
fn test_analysis_is_deterministic() {
    let req = mixed_field();
    let first = analyze(&req, &config()).unwrap();
    let second = analyze(&req, &config()).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_missing_ndvi_skips_scoring() {
    let req = request(&[("green", vec![0.3, 0.3]), ("swir", vec![0.1, 0.12])]);
    let result = analyze(&req, &config()).unwrap();

    assert!(result.interpretations.contains_key(&SpectralIndex::Mndwi));
    assert!(result.health_zones.is_none());
    assert!(result.pest_assessment.is_none());
    assert!(result.recommendations.is_empty());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.starts_with("Insufficient signal")));
}

#[test]
fn test_score_health_requires_ndvi() {
    let env = Environment::default().resolve();
    let err = score_health(
        &BTreeMap::new(),
        &IndexSet::new(),
        0,
        &env,
        &CropType::Generic.baseline(),
        &config().health,
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientSignal));
}

#[test]
fn test_health_score_weighting() {
    let result = analyze(&vegetated_field(), &config()).unwrap();
    let crop = &result.health_zones.unwrap().crop_health;

    // vegetation saturates, water neutral, environment at neutral readings
    assert_relative_eq!(crop.signals.vegetation, 1.0);
    assert_relative_eq!(crop.signals.water, 0.5);
    assert_eq!(crop.signals.water_source, WaterSource::Unavailable);
    assert_relative_eq!(crop.signals.environment, 1.0);
    assert_relative_eq!(crop.overall_score, 0.875, epsilon = 1e-9);
    assert_eq!(crop.dominant_zone, HealthZone::Nominal);

    assert_eq!(
        result.environment.defaulted,
        vec!["temperature", "humidity", "soil_moisture"]
    );
}

#[test]
fn test_heat_stress_zone_and_recommendation() {
    let mut req = vegetated_field();
    req.environment.temperature = Some(38.0);
    let result = analyze(&req, &config()).unwrap();

    let zones = result.health_zones.unwrap();
    assert_eq!(zones.crop_health.dominant_zone, HealthZone::HeatStressed);

    let heat = result
        .recommendations
        .iter()
        .find(|r| r.kind == RecommendationKind::HeatStress)
        .unwrap();
    assert_eq!(heat.priority, Priority::High);
    assert!(!heat.actions.is_empty());
}

#[test]
fn test_water_stress_triggers_irrigation() {
    let mut req = request(&[
        ("nir", vec![0.6, 0.62]),
        ("red", vec![0.05, 0.05]),
        ("swir", vec![0.7, 0.72]),
    ]);
    req.environment.soil_moisture = Some(10.0);
    let result = analyze(&req, &config()).unwrap();

    let zones = result.health_zones.unwrap();
    assert_eq!(zones.crop_health.signals.water_source, WaterSource::Ndwi);
    assert_eq!(zones.crop_health.dominant_zone, HealthZone::WaterStressed);

    let irrigation = result
        .recommendations
        .iter()
        .find(|r| r.kind == RecommendationKind::Irrigation)
        .unwrap();
    assert_eq!(irrigation.priority, Priority::High);
}

#[test]
fn test_default_cap_keeps_soil_health() {
    let mut req = request(&[
        ("nir", vec![0.20, 0.20, 0.20]),
        ("red", vec![0.15, 0.15, 0.15]),
        ("green", vec![0.60, 0.60, 0.60]),
        ("swir", vec![0.10, 0.10, 0.10]),
    ]);
    req.crop_type = Some("rice".to_string());
    req.environment = Environment {
        temperature: Some(36.0),
        humidity: Some(92.0),
        soil_moisture: Some(8.0),
    };
    let result = analyze(&req, &config()).unwrap();
    let recs = &result.recommendations;

    let soil = recs
        .iter()
        .find(|r| r.kind == RecommendationKind::SoilHealth)
        .unwrap();
    assert_eq!(soil.priority, Priority::Medium);
    assert!(recs.len() <= config().max_recommendations);

    // A tighter cap keeps the highest priorities
    let tight = ScoringConfig {
        max_recommendations: 2,
        ..config()
    };
    let capped = analyze(&req, &tight).unwrap().recommendations;
    assert_eq!(capped.len(), 2);
    assert!(capped.iter().all(|r| r.priority == Priority::High));
}

#[test]
fn test_recommendations_unique_sorted_and_capped() {
    let mut req = request(&[
        ("nir", vec![0.20, 0.25, 0.22]),
        ("red", vec![0.15, 0.18, 0.16]),
        ("swir", vec![0.40, 0.45, 0.42]),
        ("green", vec![0.10, 0.12, 0.11]),
    ]);
    req.crop_type = Some("rice".to_string());
    req.environment = Environment {
        temperature: Some(36.0),
        humidity: Some(92.0),
        soil_moisture: Some(8.0),
    };
    let result = analyze(&req, &config()).unwrap();
    let recs = &result.recommendations;

    assert!(!recs.is_empty());
    assert!(recs.len() <= config().max_recommendations);

    let mut kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(kinds.len(), recs.len());

    assert!(recs.windows(2).all(|w| w[0].priority >= w[1].priority));
}

#[test]
fn test_pest_risk_monotonic_in_temperature() {
    let result = analyze(&vegetated_field(), &config()).unwrap();
    let model = PestModel::default();

    let mut previous = f64::MIN;
    for t in 0..=50 {
        let env = Environment {
            temperature: Some(t as f64),
            humidity: Some(80.0),
            soil_moisture: None,
        }
        .resolve();
        let risk = assess_pest_risk(&result.indices_stats, &env, CropType::Generic, &model)
            .unwrap()
            .overall_risk;
        assert!(risk >= previous, "risk fell at {t} °C");
        assert!((0.0..=1.0).contains(&risk));
        previous = risk;
    }
}

#[test]
fn test_pest_risk_monotonic_in_humidity() {
    let result = analyze(&vegetated_field(), &config()).unwrap();
    let model = PestModel::default();

    let mut previous = f64::MIN;
    for h in 0..=100 {
        let env = Environment {
            temperature: Some(30.0),
            humidity: Some(h as f64),
            soil_moisture: None,
        }
        .resolve();
        let risk = assess_pest_risk(&result.indices_stats, &env, CropType::Rice, &model)
            .unwrap()
            .overall_risk;
        assert!(risk >= previous, "risk fell at {h} %");
        previous = risk;
    }
}

#[test]
fn test_pest_risk_monotonic_in_vegetation_deficit() {
    let env = Environment::default().resolve();
    let model = PestModel::default();
    let risk = |ndvi: f64| {
        assess_pest_risk(&summaries(ndvi, Some(0.2)), &env, CropType::Wheat, &model)
            .unwrap()
            .overall_risk
    };

    // NDVI falling from 1.0 to -1.0
    let mut previous = f64::MIN;
    for step in 0..=40 {
        let ndvi = 1.0 - step as f64 * 0.05;
        let r = risk(ndvi);
        assert!(r >= previous, "risk fell at NDVI {ndvi}");
        previous = r;
    }
    assert!(risk(0.1) > risk(0.8));
}

#[test]
fn test_pest_risk_monotonic_in_ndwi_anomaly() {
    let env = Environment::default().resolve();
    let model = PestModel::default();
    let risk = |ndwi: f64| {
        assess_pest_risk(&summaries(0.7, Some(ndwi)), &env, CropType::Generic, &model)
            .unwrap()
            .overall_risk
    };

    // Moving away from the optimum on either side
    let optimum = model.ndwi_optimum;
    for direction in [1.0, -1.0] {
        let mut previous = f64::MIN;
        for step in 0..=20 {
            let ndwi = optimum + direction * step as f64 * 0.05;
            let r = risk(ndwi);
            assert!(r >= previous, "risk fell at NDWI {ndwi}");
            previous = r;
        }
    }
    assert!(risk(0.8) > risk(optimum));
    assert!(risk(-0.4) > risk(optimum));
}

#[test]
fn test_pest_risk_for_healthy_field() {
    let result = analyze(&vegetated_field(), &config()).unwrap();
    let pest = result.pest_assessment.unwrap();

    // Only the neutral weather contributes: 0.15 * 1/3 + 0.15 * 1/4
    assert_relative_eq!(pest.overall_risk, 0.0875, epsilon = 1e-9);
    assert_eq!(pest.risk_level, RiskLevel::Low);
    assert!(!pest.favorable_for_pests);
    assert_eq!(pest.specific_pests.len(), 4);

    let water = pest
        .contributing_factors
        .iter()
        .find(|f| f.name == "water_anomaly")
        .unwrap();
    assert!(!water.available);
}

#[test]
fn test_warm_humid_conditions_add_increment() {
    let result = analyze(&vegetated_field(), &config()).unwrap();
    let model = PestModel::default();
    let risk_at = |t: f64, h: f64| {
        let env = Environment {
            temperature: Some(t),
            humidity: Some(h),
            soil_moisture: None,
        }
        .resolve();
        assess_pest_risk(&result.indices_stats, &env, CropType::Generic, &model).unwrap()
    };

    let below = risk_at(28.0, 75.0);
    let above = risk_at(28.5, 75.0);
    assert!(!below.favorable_for_pests);
    assert!(above.favorable_for_pests);
    assert!(above.overall_risk - below.overall_risk >= model.favorable_increment);
}

#[test]
fn test_risk_level_cuts() {
    let model = PestModel::default();
    assert_eq!(RiskLevel::from_score(0.32, &model), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0.33, &model), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.66, &model), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.67, &model), RiskLevel::High);
}

#[test]
fn test_crop_specific_pests() {
    let mut req = vegetated_field();
    req.crop_type = Some("rice".to_string());
    req.environment.humidity = Some(85.0);
    let result = analyze(&req, &config()).unwrap();

    let pest = result.pest_assessment.unwrap();
    assert_eq!(pest.crop_type, CropType::Rice);
    let names: Vec<&str> = pest.specific_pests.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["brown_planthopper", "rice_blast", "stem_borer", "leaf_folder"]
    );
    let planthopper = &pest.specific_pests[0];
    assert!(planthopper.favorable);
    assert_relative_eq!(planthopper.risk, pest.overall_risk * 0.9, epsilon = 1e-12);
}

#[test]
fn test_unknown_crop_uses_generic_baseline() {
    let mut req = vegetated_field();
    req.crop_type = Some("banana".to_string());
    let result = analyze(&req, &config()).unwrap();

    assert_eq!(result.summary.crop_type, CropType::Generic);
    assert!(result.diagnostics.iter().any(|d| d.contains("banana")));
}

#[test]
fn test_crop_health_zones_per_pixel() {
    let req = request(&[
        ("nir", vec![0.60, 0.50, 0.30, 0.20]),
        ("red", vec![0.05, 0.15, 0.15, 0.18]),
    ]);
    let result = analyze(&req, &config()).unwrap();
    let zones = result.health_zones.unwrap();

    // NDVI ~0.846, 0.538, 0.333, 0.053 without NDWI
    let stats = &zones.crop_health.statistics;
    assert_eq!(stats.values().sum::<usize>(), 4);
    assert_eq!(stats.len(), 4);
    assert_relative_eq!(zones.crop_health.pixel_score, 0.625, epsilon = 1e-12);
    assert_relative_eq!(zones.field_uniformity.crop_variability, 1.0);
}

#[test]
fn test_ndvi_history_trend() {
    let mut req = vegetated_field();
    req.ndvi_history = Some(vec![0.7, 0.65, 0.6, 0.55]);
    let result = analyze(&req, &config()).unwrap();

    assert_eq!(result.ndvi_trend.unwrap().trend, TrendKind::Declining);
}

#[test]
fn test_result_serialization() {
    let req = request(&[
        ("nir", vec![0.0, 0.0]),
        ("swir", vec![0.0, 0.0]),
        ("red", vec![0.05, 0.05]),
    ]);
    let result = analyze(&req, &config()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["indices_stats"]["NDVI"]["status"], "computed");
    assert_eq!(json["indices_stats"]["NDWI"]["status"], "no_valid_samples");
    assert!(json["land_cover_analysis"]["land_cover_stats"]["Snow/Ice"]["percentage"].is_number());
    assert_eq!(json["summary"]["indices_calculated"][1], "NDWI");
    assert_eq!(json["summary"]["crop_type"], "generic");
    assert!(json.get("ndvi_trend").is_none());
    assert!(json.get("indices").is_none());
}

#[test]
fn test_request_deserialization() {
    let req: AnalysisRequest = serde_json::from_str(
        r#"{
            "bands": {"nir": [0.6, 0.7], "red": [0.05, 0.06]},
            "environment": {"temperature": 31.5},
            "crop_type": "wheat"
        }"#,
    )
    .unwrap();

    assert_eq!(req.environment.temperature, Some(31.5));
    assert_eq!(req.environment.humidity, None);

    let result = analyze(&req, &config()).unwrap();
    assert_eq!(result.summary.crop_type, CropType::Wheat);
    assert_eq!(result.environment.defaulted, vec!["humidity", "soil_moisture"]);
}
