/// Data layer: spectral datasets in and out of the synthesizer.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file(s) → SpectralDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  metadata selection → class / blank indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ calibrate  │  ClassProfile ×2 + NoiseProfile on one axis
///   └───────────┘
///        │  synth::generate
///        ▼
///   ┌──────────┐
///   │  export   │  GeneratedCohort → .csv / .json / .parquet
///   └──────────┘
/// ```

pub mod calibrate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
