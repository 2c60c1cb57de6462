/// Synthesis layer: calibration checks, samplers, and cohort assembly.
///
/// Architecture:
/// ```text
///  ClassProfile (neg)   ClassProfile (pos)   NoiseProfile
///          │                   │                  │
///          └─────────┬─────────┴──────────────────┘
///                    ▼
///             ┌─────────────┐
///             │ Calibration │  shape / consistency checks
///             └─────────────┘
///                    │
///        ┌───────────┴────────────┐
///        ▼                        ▼
///  ┌─────────────┐         ┌─────────────┐
///  │ variability │  β · B  │    noise    │  z ⊙ σ
///  └─────────────┘         └─────────────┘
///        │                        │
///        └───────────┬────────────┘
///                    ▼
///             ┌─────────────┐
///             │   cohort    │  mean + variability + noise, labels
///             └─────────────┘
/// ```
///
/// Every random draw comes from a generator owned by exactly one
/// (class, component, sample) triple, see [`stream`].

pub mod cohort;
pub mod error;
pub mod noise;
pub mod profile;
pub mod spec;
pub mod stream;
pub mod variability;

use std::fmt;

pub use cohort::{generate, GeneratedCohort};
pub use error::{Result, SynthError};
pub use noise::NoiseSampler;
pub use profile::{Calibration, ClassProfile, NoiseProfile};
pub use spec::{ClassCounts, ClassScales, GenerationSpec, VariabilityScale};
pub use variability::VariabilitySampler;

// ---------------------------------------------------------------------------
// Class – the two populations of a cohort
// ---------------------------------------------------------------------------

/// One of the two populations a cohort is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    /// Control population, label 0.
    Negative,
    /// Case population, label 1.
    Positive,
}

impl Class {
    /// Both classes in emission order.
    pub const ALL: [Class; 2] = [Class::Negative, Class::Positive];

    /// Numeric label written into [`GeneratedCohort::labels`].
    pub fn label(self) -> u8 {
        match self {
            Class::Negative => 0,
            Class::Positive => 1,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Negative => write!(f, "negative"),
            Class::Positive => write!(f, "positive"),
        }
    }
}
