// src/main.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use agri_spectral::analysis::analyze;
use agri_spectral::bands::Environment;
use agri_spectral::batch::process_batch;
use agri_spectral::cli::{Cli, Commands};
use agri_spectral::config::ScoringConfig;
use agri_spectral::io::{read_history, read_request, to_json, write_result};
use agri_spectral::processing::trend::analyze_trend;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")
}

fn emit<T: Serialize>(value: &T, cli: &Cli) -> Result<()> {
    match &cli.output {
        Some(path) => {
            write_result(value, path, cli.pretty)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Output written: {}", path.display());
        }
        None => println!("{}", to_json(value, cli.pretty)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match &cli.command {
        Commands::Analyze {
            input,
            crop,
            temperature,
            humidity,
            soil_moisture,
        } => {
            let scoring = match &cli.scoring {
                Some(path) => ScoringConfig::from_path(path)
                    .with_context(|| format!("Failed to load scoring config {}", path.display()))?,
                None => ScoringConfig::default(),
            };
            let mut request = read_request(input)
                .with_context(|| format!("Failed to read request {}", input.display()))?;
            if crop.is_some() {
                request.crop_type = crop.clone();
            }
            request.environment = request.environment.merged_with(&Environment {
                temperature: *temperature,
                humidity: *humidity,
                soil_moisture: *soil_moisture,
            });

            let result = analyze(&request, &scoring)?;
            emit(&result, &cli)?;
        }
        Commands::Batch { config } => {
            let report = process_batch(config)?;
            info!(
                succeeded = report.succeeded.len(),
                total = report.total(),
                "Batch finished"
            );
            if cli.output.is_some() {
                emit(&report, &cli)?;
            }
            if !report.is_success() {
                for failure in &report.failed {
                    eprintln!("{}: {}", failure.field, failure.error);
                }
                bail!("{} of {} fields failed", report.failed.len(), report.total());
            }
        }
        Commands::Trend { history } => {
            let values = read_history(history)
                .with_context(|| format!("Failed to read history {}", history.display()))?;
            emit(&analyze_trend(&values), &cli)?;
        }
    }

    Ok(())
}
