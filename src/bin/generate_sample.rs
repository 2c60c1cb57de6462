//! Writes a demo calibration dataset (`sample_calibration.parquet`) and a
//! matching run config (`sample_run.json`) into the current directory.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde_json::json;

use specsynth::data::export::write_dataset;
use specsynth::data::model::{MetadataValue, SpectralDataset, Spectrum};

/// (centre, width, amplitude) of one absorption band.
type Band = (f64, f64, f64);

const CONTROL_BANDS: [Band; 4] = [
    (1740.0, 12.0, 0.15), // lipid ester C=O
    (1650.0, 20.0, 0.90), // amide I
    (1545.0, 18.0, 0.55), // amide II
    (1080.0, 25.0, 0.30), // phosphate
];

/// Amplitude multipliers of the case class relative to the control bands.
const CASE_SHIFT: [f64; 4] = [1.25, 0.95, 1.0, 1.35];

const NOISE_STD: f64 = 0.002;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// One measured spectrum: bands with per-sample amplitude jitter, a
/// baseline offset and instrument noise.
fn measure(wavenumbers: &[f64], bands: &[Band], biological: bool, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let jitter: Vec<f64> = bands
        .iter()
        .map(|_| {
            if biological {
                1.0 + 0.08 * rng.sample::<f64, _>(StandardNormal)
            } else {
                1.0
            }
        })
        .collect();
    let baseline = if biological {
        0.01 * rng.sample::<f64, _>(StandardNormal)
    } else {
        0.0
    };

    wavenumbers
        .iter()
        .map(|&wn| {
            let signal: f64 = bands
                .iter()
                .zip(&jitter)
                .map(|(&(mu, sigma, amp), j)| gaussian(wn, mu, sigma, amp * j))
                .sum();
            signal + baseline + NOISE_STD * rng.sample::<f64, _>(StandardNormal)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // Fingerprint region 1800 → 902 cm⁻¹, step 2
    let wavenumbers: Vec<f64> = (0..450).map(|i| 1800.0 - i as f64 * 2.0).collect();

    let case_bands: Vec<Band> = CONTROL_BANDS
        .iter()
        .zip(CASE_SHIFT)
        .map(|(&(mu, sigma, amp), shift)| (mu, sigma, amp * shift))
        .collect();
    let groups: [(&str, &[Band], usize, bool); 3] = [
        ("control", CONTROL_BANDS.as_slice(), 30, true),
        ("case", case_bands.as_slice(), 30, true),
        ("blank", &[] as &[Band], 10, false),
    ];

    let mut spectra = Vec::new();
    for (class, bands, count, biological) in groups {
        for replicate in 0..count {
            let metadata = BTreeMap::from([
                ("class".to_string(), MetadataValue::String(class.to_string())),
                ("replicate".to_string(), MetadataValue::Integer(replicate as i64)),
                (
                    "measurement_id".to_string(),
                    MetadataValue::Integer(spectra.len() as i64),
                ),
            ]);
            spectra.push(Spectrum {
                x: wavenumbers.clone(),
                y: measure(&wavenumbers, bands, biological, &mut rng),
                metadata,
            });
        }
    }
    let dataset = SpectralDataset::from_spectra(spectra);

    let data_path = Path::new("sample_calibration.parquet");
    write_dataset(data_path, &dataset)?;

    let config = json!({
        "inputs": [data_path],
        "label_column": "class",
        "negative": "control",
        "positive": "case",
        "noise": { "blank": "blank" },
        "generation": {
            "n_samples_per_class": { "neg": 100, "pos": 100 },
            "variability_scale": { "neg": "auto", "pos": "auto" },
            "seed": 42
        },
        "output": "sample_cohort.csv"
    });
    std::fs::write("sample_run.json", serde_json::to_string_pretty(&config)?)
        .context("writing sample_run.json")?;

    println!(
        "Wrote {} spectra ({} wavenumbers each) to {} and a run config to sample_run.json",
        dataset.len(),
        wavenumbers.len(),
        data_path.display()
    );
    Ok(())
}
