use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde_json::json;

use specsynth::config::RunConfig;
use specsynth::data::calibrate::calibrate;
use specsynth::data::export::{write_cohort, write_dataset};
use specsynth::data::loader::{load_file, load_files};
use specsynth::data::model::{MetadataValue, SpectralDataset, Spectrum};
use specsynth::synth::generate;

const AXIS: [f64; 5] = [1700.0, 1650.0, 1600.0, 1550.0, 1500.0];

fn spectrum(class: &str, y: [f64; 5]) -> Spectrum {
    Spectrum {
        x: AXIS.to_vec(),
        y: y.to_vec(),
        metadata: BTreeMap::from([
            ("class".to_string(), MetadataValue::String(class.to_string())),
            ("batch".to_string(), MetadataValue::Integer(1)),
        ]),
    }
}

fn calibration_dataset() -> SpectralDataset {
    SpectralDataset::from_spectra(vec![
        spectrum("control", [0.10, 0.80, 0.30, 0.50, 0.20]),
        spectrum("control", [0.12, 0.75, 0.31, 0.55, 0.18]),
        spectrum("control", [0.09, 0.85, 0.28, 0.47, 0.22]),
        spectrum("case", [0.20, 0.70, 0.30, 0.50, 0.40]),
        spectrum("case", [0.22, 0.66, 0.33, 0.52, 0.43]),
        spectrum("blank", [0.001, -0.002, 0.000, 0.002, -0.001]),
        spectrum("blank", [-0.001, 0.001, 0.001, -0.002, 0.000]),
        spectrum("blank", [0.000, 0.002, -0.001, 0.001, 0.001]),
    ])
}

fn write_config(dir: &Path, output: &str) -> std::path::PathBuf {
    let config = json!({
        "inputs": ["calibration.parquet"],
        "label_column": "class",
        "negative": "control",
        "positive": "case",
        "noise": { "blank": "blank" },
        "generation": {
            "n_samples_per_class": { "neg": 6, "pos": 4 },
            "variability_scale": { "neg": "auto", "pos": 1.0 },
            "seed": 42
        },
        "output": output
    });
    let path = dir.join("run.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn calibrate_generate_export_reload() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("calibration.parquet"), &calibration_dataset()).unwrap();
    let config = RunConfig::load(&write_config(dir.path(), "cohort.parquet")).unwrap();

    let dataset = load_files(&config.inputs).unwrap();
    assert_eq!(dataset.len(), 8);
    let calibration = calibrate(
        &dataset,
        &config.negative_selection(),
        &config.positive_selection(),
        &config.noise_source(),
    )
    .unwrap();
    assert_eq!(calibration.negative.n_deviations(), 3);
    assert_eq!(calibration.positive.n_deviations(), 2);
    assert!(calibration.noise.std().iter().all(|&s| s > 0.0 && s < 0.01));

    let cohort = generate(
        &calibration.negative,
        &calibration.positive,
        &calibration.noise,
        &config.generation,
    )
    .unwrap();
    let output = config.output.clone().unwrap();
    write_cohort(&output, &cohort, &calibration.wavenumbers).unwrap();

    let reloaded = load_file(&output).unwrap();
    assert_eq!(reloaded.len(), 10);
    let labels: Vec<MetadataValue> = reloaded
        .spectra
        .iter()
        .map(|sp| sp.metadata["label"].clone())
        .collect();
    let expected: Vec<MetadataValue> = [0, 0, 0, 0, 0, 0, 1, 1, 1, 1]
        .into_iter()
        .map(MetadataValue::Integer)
        .collect();
    assert_eq!(labels, expected);
    assert!(reloaded.spectra.iter().all(|sp| sp.x == AXIS.to_vec()));
}

#[test]
fn cli_generate_writes_wide_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("calibration.parquet"), &calibration_dataset()).unwrap();
    let config = write_config(dir.path(), "cohort.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_specsynth"))
        .args(["--log-level", "warn", "generate", "--config"])
        .arg(&config)
        .args(["--n-pos", "2", "--threads", "2"])
        .status()
        .unwrap();
    assert!(status.success());

    let mut reader = csv::Reader::from_path(dir.path().join("cohort.csv")).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 1 + AXIS.len());
    let labels: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    assert_eq!(labels, vec!["0", "0", "0", "0", "0", "0", "1", "1"]);
}

#[test]
fn cli_rejects_negative_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("calibration.parquet"), &calibration_dataset()).unwrap();
    let config = write_config(dir.path(), "cohort.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_specsynth"))
        .args(["generate", "--config"])
        .arg(&config)
        .args(["--n-neg", "-3"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("non-negative"));
    assert!(!dir.path().join("cohort.csv").exists());
}
