use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

use specsynth::config::{Overrides, RunConfig};
use specsynth::data::calibrate::{calibrate, CalibrationData};
use specsynth::data::export::write_cohort;
use specsynth::data::loader::load_files;
use specsynth::synth::variability::resolve_coefficient_std;
use specsynth::{generate, Class};

#[derive(Parser)]
#[command(name = "specsynth")]
#[command(about = "Synthetic two-class spectral cohorts from empirical calibration data")]
#[command(version)]
struct Cli {
    /// Default log filter when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate from measured spectra and write a synthetic cohort
    Generate {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the generation seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of negative-class samples
        #[arg(long, allow_hyphen_values = true)]
        n_neg: Option<i64>,

        /// Override the number of positive-class samples
        #[arg(long, allow_hyphen_values = true)]
        n_pos: Option<i64>,

        /// Output file (.csv, .json or .parquet)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (0 = one per core). Output does not depend on it.
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// Print the calibration summary for a run configuration as JSON
    Profile {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    match cli.command {
        Commands::Generate {
            config,
            seed,
            n_neg,
            n_pos,
            output,
            threads,
        } => {
            let overrides = Overrides {
                seed,
                n_negative: n_neg,
                n_positive: n_pos,
                output,
            };
            cmd_generate(&config, &overrides, threads)
        }
        Commands::Profile { config } => cmd_profile(&config),
    }
}

fn load_calibration(config: &RunConfig) -> Result<CalibrationData> {
    let dataset = load_files(&config.inputs)?;
    calibrate(
        &dataset,
        &config.negative_selection(),
        &config.positive_selection(),
        &config.noise_source(),
    )
}

fn cmd_generate(config_path: &Path, overrides: &Overrides, threads: usize) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let mut config = RunConfig::load(config_path)?;
    config.apply(overrides)?;
    let output = config
        .output
        .clone()
        .context("no output path: set \"output\" in the config or pass --output")?;

    let calibration = load_calibration(&config)?;
    let cohort = generate(
        &calibration.negative,
        &calibration.positive,
        &calibration.noise,
        &config.generation,
    )?;
    write_cohort(&output, &cohort, &calibration.wavenumbers)?;

    info!(
        "Done: {} spectra ({} features) -> {}",
        cohort.len(),
        cohort.n_features(),
        output.display()
    );
    Ok(())
}

fn cmd_profile(config_path: &Path) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let calibration = load_calibration(&config)?;

    let mut classes = serde_json::Map::new();
    for class in Class::ALL {
        let profile = match class {
            Class::Negative => &calibration.negative,
            Class::Positive => &calibration.positive,
        };
        let scale = config.generation.variability_scale.get(class);
        let coefficient_std = resolve_coefficient_std(scale, class, profile.n_deviations())?;
        let variance = profile.empirical_variance();
        classes.insert(
            class.to_string(),
            json!({
                "n_deviations": profile.n_deviations(),
                "variability_scale": scale,
                "coefficient_std": coefficient_std,
                "mean_empirical_std": variance.mapv(f64::sqrt).mean(),
            }),
        );
    }

    let noise = calibration.noise.std();
    let summary = json!({
        "n_features": calibration.wavenumbers.len(),
        "wavenumber_range": [
            calibration.wavenumbers.first(),
            calibration.wavenumbers.last(),
        ],
        "classes": classes,
        "noise": {
            "mean_std": noise.mean(),
            "max_std": noise.iter().copied().fold(0.0_f64, f64::max),
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
