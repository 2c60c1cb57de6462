//! Run configuration: which spectra calibrate each class, where noise comes
//! from, and what to generate.
//!
//! ```json
//! {
//!   "inputs": ["calibration.parquet"],
//!   "label_column": "class",
//!   "negative": "control",
//!   "positive": "case",
//!   "noise": { "blank": "blank" },
//!   "generation": {
//!     "n_samples_per_class": { "neg": 100, "pos": 100 },
//!     "variability_scale": { "neg": "auto", "pos": 1.5 },
//!     "seed": 42
//!   },
//!   "output": "cohort.csv"
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::calibrate::NoiseSource;
use crate::data::filter::{select_equal, Selection};
use crate::data::model::MetadataValue;
use crate::synth::{ClassCounts, GenerationSpec};

/// Source of the measurement-noise profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseConfig {
    /// Label value (in `label_column`) of repeated blank measurements.
    Blank(String),
    /// Same standard deviation on every wavenumber.
    UniformStd(f64),
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig::UniformStd(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Dataset partitions, concatenated in order. Relative paths resolve
    /// against the config file's directory.
    pub inputs: Vec<PathBuf>,
    pub label_column: String,
    pub negative: String,
    pub positive: String,
    #[serde(default)]
    pub noise: NoiseConfig,
    pub generation: GenerationSpec,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub n_negative: Option<i64>,
    pub n_positive: Option<i64>,
    pub output: Option<PathBuf>,
}

impl RunConfig {
    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.inputs = config.inputs.iter().map(|p| base.join(p)).collect();
            config.output = config.output.map(|p| base.join(p));
        }
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(seed) = overrides.seed {
            self.generation.seed = seed;
        }
        let counts = self.generation.n_samples_per_class;
        if overrides.n_negative.is_some() || overrides.n_positive.is_some() {
            self.generation.n_samples_per_class = ClassCounts::try_new(
                overrides.n_negative.unwrap_or(counts.negative as i64),
                overrides.n_positive.unwrap_or(counts.positive as i64),
            )?;
        }
        if let Some(output) = &overrides.output {
            self.output = Some(output.clone());
        }
        Ok(())
    }

    pub fn negative_selection(&self) -> Selection {
        select_equal(&self.label_column, MetadataValue::infer(&self.negative))
    }

    pub fn positive_selection(&self) -> Selection {
        select_equal(&self.label_column, MetadataValue::infer(&self.positive))
    }

    pub fn noise_source(&self) -> NoiseSource {
        match &self.noise {
            NoiseConfig::Blank(value) => {
                NoiseSource::Blanks(select_equal(&self.label_column, MetadataValue::infer(value)))
            }
            NoiseConfig::UniformStd(std) => NoiseSource::Uniform(*std),
        }
    }
}
