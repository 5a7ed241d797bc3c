// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::analyze;
use crate::bands::Environment;
use crate::config::ScoringConfig;
use crate::io::write_result;
use crate::processing::ParallelProcessor;
use crate::utils::cache::RequestCache;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub fields: Vec<FieldJob>,
}

/// Defaults applied to every field unless the field or its request file
/// says otherwise
#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Scoring configuration file; built-in calibration when absent
    #[serde(default)]
    pub scoring: Option<PathBuf>,
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            crop_type: None,
            environment: Environment::default(),
            pretty: true,
            scoring: None,
            threads: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Debug)]
pub struct FieldJob {
    #[serde(default)]
    pub name: Option<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub crop_type: Option<String>,
    pub environment: Option<Environment>,
}

impl FieldJob {
    fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

#[derive(Serialize, Debug, Default, PartialEq)]
pub struct JobFailure {
    pub field: String,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Serialize, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<JobFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Relative paths in a batch file are taken from the file's directory
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn run_job(
    job: &FieldJob,
    global: &GlobalParams,
    base: &Path,
    cache: &RequestCache,
    scoring: &ScoringConfig,
) -> Result<PathBuf> {
    let input = resolve(base, &job.input);
    let output = resolve(base, &job.output);

    let cached = cache
        .get_request(&input)
        .with_context(|| format!("Failed to read request {}", input.display()))?;
    let mut request = (*cached).clone();

    request.crop_type = job
        .crop_type
        .clone()
        .or(request.crop_type)
        .or_else(|| global.crop_type.clone());
    request.environment = global.environment.merged_with(&request.environment);
    if let Some(overrides) = &job.environment {
        request.environment = request.environment.merged_with(overrides);
    }

    let result = analyze(&request, scoring)?;
    write_result(&result, &output, global.pretty)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(output)
}

pub fn process_batch(config_path: &Path) -> Result<BatchReport> {
    // Read and parse configuration file
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read batch config {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("Invalid batch config {}", config_path.display()))?;

    if config.fields.is_empty() {
        return Err(anyhow!("Batch config lists no fields"));
    }

    let base = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let scoring = match &config.global.scoring {
        Some(path) => {
            let path = resolve(&base, path);
            ScoringConfig::from_path(&path)
                .with_context(|| format!("Failed to load scoring config {}", path.display()))?
        }
        None => ScoringConfig::default(),
    };

    let cache = Arc::new(RequestCache::new());
    let processor = ParallelProcessor::with_cache(config.global.threads, Arc::clone(&cache));
    let total = config.fields.len();

    info!(
        fields = total,
        threads = processor.threads(),
        "Starting batch processing"
    );

    let mut finished = 0;
    let outcomes = processor.process(
        &config.fields,
        |job| run_job(job, &config.global, &base, &cache, &scoring),
        |i, outcome| {
            finished += 1;
            let field = config.fields[i].label();
            match outcome {
                Ok(output) => info!("[{}/{}] {} -> {}", finished, total, field, output.display()),
                Err(e) => error!("[{}/{}] {} failed: {:#}", finished, total, field, e),
            }
        },
    )?;

    let mut report = BatchReport::default();
    for (job, outcome) in config.fields.iter().zip(outcomes) {
        match outcome {
            Ok(_) => report.succeeded.push(job.label()),
            Err(e) => report.failed.push(JobFailure {
                field: job.label(),
                error: format!("{e:#}"),
            }),
        }
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        cached_requests = processor.cache_size(),
        "Batch processing complete"
    );
    Ok(report)
}
