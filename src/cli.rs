use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agri-spectral")]
#[command(version, about = "Spectral index, land-cover and crop health analysis")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output file path (JSON is printed to stdout when omitted)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Scoring configuration file overriding the built-in calibration
    #[arg(long, global = true)]
    pub scoring: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one field from a JSON request with band arrays
    Analyze {
        /// Request file: {"bands": {"red": [...], "nir": [...], ...}, ...}
        input: PathBuf,

        /// Crop type (rice, wheat, cotton, sugarcane, maize, generic)
        #[arg(short, long)]
        crop: Option<String>,

        /// Air temperature in °C
        #[arg(short, long, allow_hyphen_values = true)]
        temperature: Option<f64>,

        /// Relative humidity in %
        #[arg(long)]
        humidity: Option<f64>,

        /// Soil moisture in %
        #[arg(long)]
        soil_moisture: Option<f64>,
    },

    /// Analyze many fields described in a JSON batch file
    Batch {
        /// Batch configuration file
        config: PathBuf,
    },

    /// NDVI trend from a history of field means
    Trend {
        /// JSON array of NDVI means, oldest first
        history: PathBuf,
    },
}
