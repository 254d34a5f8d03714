//! Argus - anomaly scoring for short hourly metric series
//!
//! Command-line entry point: scores the dashboard metrics once and prints the
//! per-timestamp records as JSON.

use argus::api::anomaly_api::AnomalyApi;
use argus::config::ArgusConfig;
use argus::core::Metric;
use argus::generation::series_generator::InjectionIntensity;
use argus::logging;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Intensity {
    Fixed,
    Variable,
}

impl From<Intensity> for InjectionIntensity {
    fn from(value: Intensity) -> Self {
        match value {
            Intensity::Fixed => InjectionIntensity::Fixed,
            Intensity::Variable => InjectionIntensity::Variable,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(about = "Score synthetic hourly metrics for anomalies", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Spikes injected into every metric
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    spikes: i64,

    /// Drops injected into every metric
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    drops: i64,

    /// Contamination in [0.01, 0.5]; estimated per metric when omitted
    #[arg(long)]
    contamination: Option<f64>,

    /// Base seed of the synthetic series
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    intensity: Option<Intensity>,

    /// Only score the named metrics
    #[arg(short, long)]
    metric: Vec<String>,

    #[arg(long)]
    pretty: bool,
}

fn run(args: Args) -> argus::Result<String> {
    let mut config = match &args.config {
        Some(path) => ArgusConfig::from_file(path)?,
        None => ArgusConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.generator.base_seed = seed;
    }
    if let Some(intensity) = args.intensity {
        config.generator.intensity = intensity.into();
    }
    // Batch scoring only; no live streams needed.
    config.live.streams.clear();

    let metrics: Vec<Metric> = Metric::default_set()
        .into_iter()
        .filter(|m| args.metric.is_empty() || args.metric.contains(&m.name))
        .map(|m| m.with_injections(args.spikes, args.drops).with_contamination(args.contamination))
        .collect();

    let api = AnomalyApi::new(config)?;
    let rows = api.score_batch(&metrics)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string(&rows)?
    };
    Ok(json)
}

fn main() -> ExitCode {
    logging::init();
    match run(Args::parse()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
