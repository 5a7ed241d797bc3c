// src/processing/trend.rs
use serde::Serialize;

/// |slope| per observation below this is a flat series
pub const STABLE_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviTrend {
    pub trend: TrendKind,
    /// Least-squares slope per observation
    pub slope: f64,
    /// Percent change first to last; absent when the first value is zero
    pub change_rate: Option<f64>,
    pub current_ndvi: Option<f64>,
    pub average_ndvi: Option<f64>,
    pub recommendation: String,
}

/// Linear trend of an NDVI history, oldest observation first.
pub fn analyze_trend(history: &[f64]) -> NdviTrend {
    let values: Vec<f64> = history.iter().copied().filter(|v| v.is_finite()).collect();

    if values.len() < 2 {
        return NdviTrend {
            trend: TrendKind::InsufficientData,
            slope: 0.0,
            change_rate: None,
            current_ndvi: values.last().copied(),
            average_ndvi: values.first().copied(),
            recommendation: "Need more historical data for trend analysis".to_string(),
        };
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (sxy, sxx) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
            let dx = i as f64 - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
    let slope = sxy / sxx;

    let trend = if slope.abs() < STABLE_SLOPE {
        TrendKind::Stable
    } else if slope > 0.0 {
        TrendKind::Improving
    } else {
        TrendKind::Declining
    };

    let first = values[0];
    let last = values[values.len() - 1];
    let change_rate = (first != 0.0).then(|| (last - first) / first * 100.0);

    let recommendation = match trend {
        TrendKind::Declining => {
            "Consider investigating potential stressors (water, nutrients, pests)"
        }
        TrendKind::Improving => "Vegetation health is improving, maintain current practices",
        _ => "Vegetation health is stable, continue monitoring",
    };

    NdviTrend {
        trend,
        slope,
        change_rate,
        current_ndvi: Some(last),
        average_ndvi: Some(mean_y),
        recommendation: recommendation.to_string(),
    }
}
