use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;

use agri_spectral::analysis::{analyze, AnalysisRequest};
use agri_spectral::bands::{Band, BandSet, Environment};
use agri_spectral::config::ScoringConfig;
use agri_spectral::processing::indices::compute_indices;
use agri_spectral::processing::ParallelProcessor;

const PIXELS: usize = 1024;

/// Synthetic field mixing vegetation, soil and water pixels
fn synthetic_bands() -> BTreeMap<Band, Vec<f64>> {
    let mut bands = BTreeMap::new();
    let wave = |i: usize, m: usize, scale: f64| (i % m) as f64 * scale;

    bands.insert(Band::Red, (0..PIXELS).map(|i| 0.04 + wave(i, 50, 0.004)).collect());
    bands.insert(Band::Green, (0..PIXELS).map(|i| 0.06 + wave(i, 30, 0.005)).collect());
    bands.insert(Band::Nir, (0..PIXELS).map(|i| 0.30 + wave(i, 100, 0.005)).collect());
    bands.insert(Band::Swir, (0..PIXELS).map(|i| 0.10 + wave(i, 70, 0.004)).collect());
    bands
}

fn synthetic_request() -> AnalysisRequest {
    AnalysisRequest {
        bands: synthetic_bands()
            .into_iter()
            .map(|(band, values)| (band.to_string(), values))
            .collect(),
        environment: Environment {
            temperature: Some(29.0),
            humidity: Some(72.0),
            soil_moisture: Some(30.0),
        },
        crop_type: Some("rice".to_string()),
        ndvi_history: Some(vec![0.55, 0.58, 0.6, 0.62]),
    }
}

/// Benchmark the index computation in isolation
fn benchmark_index_calculation(c: &mut Criterion) {
    let bands = match BandSet::new(synthetic_bands()) {
        Ok(bands) => bands,
        Err(e) => panic!("synthetic bands rejected: {e}"),
    };

    c.bench_function("compute_indices_1024", |b| {
        b.iter(|| compute_indices(black_box(&bands)))
    });
}

/// Benchmark the full analysis of one field
fn benchmark_full_analysis(c: &mut Criterion) {
    let request = synthetic_request();
    let config = ScoringConfig::default();

    c.bench_function("analyze_field_1024", |b| {
        b.iter(|| analyze(black_box(&request), &config))
    });
}

/// Benchmark many fields on the thread pool
fn benchmark_parallel_fields(c: &mut Criterion) {
    let requests: Vec<AnalysisRequest> = (0..32).map(|_| synthetic_request()).collect();
    let config = ScoringConfig::default();
    let processor = ParallelProcessor::new(None);

    c.bench_function("analyze_32_fields_parallel", |b| {
        b.iter(|| processor.analyze_all(black_box(&requests), &config))
    });
}

criterion_group!(
    benches,
    benchmark_index_calculation,
    benchmark_full_analysis,
    benchmark_parallel_fields
);
criterion_main!(benches);
