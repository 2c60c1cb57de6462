//! Synthetic two-class spectral cohorts.
//!
//! [`synth::generate`] draws labelled synthetic spectra from per-class
//! calibration profiles (mean spectrum plus empirical deviation vectors) and
//! a per-feature measurement-noise profile. The [`data`] layer estimates those
//! profiles from measured spectra and writes generated cohorts back to disk.

pub mod config;
pub mod data;
pub mod synth;

pub use synth::{
    generate, Class, ClassProfile, GeneratedCohort, GenerationSpec, NoiseProfile, SynthError,
    VariabilityScale,
};
