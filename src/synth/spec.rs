use serde::{Deserialize, Serialize};

use super::error::{Result, SynthError};
use super::Class;

// ---------------------------------------------------------------------------
// VariabilityScale – explicit magnitude or auto-estimation
// ---------------------------------------------------------------------------

/// How much biological variability to inject for one class.
///
/// Serialized as a number (`Explicit`), the string `"auto"`, or
/// `{ "coefficient_std": b }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ScaleRepr", into = "ScaleRepr")]
pub enum VariabilityScale {
    /// Reproduce the empirical per-feature variance of the deviation rows.
    #[default]
    Auto,
    /// Multiplier on the empirical spread: `1.0` matches `Auto`, `2.0`
    /// doubles the per-feature standard deviation.
    Explicit(f64),
    /// Raw standard deviation of the per-row combination coefficients,
    /// bypassing the `1/√K` normalisation.
    CoefficientStd(f64),
}

impl VariabilityScale {
    /// Reject explicit values that are not finite and strictly positive.
    pub fn validate(self, class: Class) -> Result<Self> {
        match self {
            Self::Auto => Ok(self),
            Self::Explicit(value) | Self::CoefficientStd(value) => {
                if value.is_finite() && value > 0.0 {
                    Ok(self)
                } else {
                    Err(SynthError::InvalidScale { class, value })
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ScaleRepr {
    Number(f64),
    Mode(String),
    Coefficient { coefficient_std: f64 },
}

impl TryFrom<ScaleRepr> for VariabilityScale {
    type Error = String;

    fn try_from(repr: ScaleRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ScaleRepr::Number(v) => Ok(Self::Explicit(v)),
            ScaleRepr::Mode(mode) if mode.eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            ScaleRepr::Mode(other) => Err(format!(
                "unknown variability scale mode '{other}', expected a number or \"auto\""
            )),
            ScaleRepr::Coefficient { coefficient_std } => Ok(Self::CoefficientStd(coefficient_std)),
        }
    }
}

impl From<VariabilityScale> for ScaleRepr {
    fn from(scale: VariabilityScale) -> Self {
        match scale {
            VariabilityScale::Auto => ScaleRepr::Mode("auto".into()),
            VariabilityScale::Explicit(v) => ScaleRepr::Number(v),
            VariabilityScale::CoefficientStd(v) => ScaleRepr::Coefficient { coefficient_std: v },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-class pairs
// ---------------------------------------------------------------------------

/// Number of synthetic samples to draw for each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "SignedCounts", into = "SignedCounts")]
pub struct ClassCounts {
    pub negative: usize,
    pub positive: usize,
}

impl ClassCounts {
    pub fn new(negative: usize, positive: usize) -> Self {
        Self { negative, positive }
    }

    /// Convert counts from a signed source such as a config file.
    pub fn try_new(negative: i64, positive: i64) -> Result<Self> {
        let convert = |class: Class, n: i64| {
            usize::try_from(n).map_err(|_| {
                SynthError::invalid_sample_count(format!("{class} count must be non-negative, got {n}"))
            })
        };
        Ok(Self {
            negative: convert(Class::Negative, negative)?,
            positive: convert(Class::Positive, positive)?,
        })
    }

    pub fn get(&self, class: Class) -> usize {
        match class {
            Class::Negative => self.negative,
            Class::Positive => self.positive,
        }
    }

    /// Total number of rows in the resulting cohort.
    pub fn total(&self) -> usize {
        self.negative + self.positive
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SignedCounts {
    neg: i64,
    pos: i64,
}

impl TryFrom<SignedCounts> for ClassCounts {
    type Error = SynthError;

    fn try_from(raw: SignedCounts) -> Result<Self> {
        Self::try_new(raw.neg, raw.pos)
    }
}

impl From<ClassCounts> for SignedCounts {
    fn from(counts: ClassCounts) -> Self {
        Self {
            neg: counts.negative as i64,
            pos: counts.positive as i64,
        }
    }
}

/// Variability scale for each class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassScales {
    #[serde(rename = "neg", default)]
    pub negative: VariabilityScale,
    #[serde(rename = "pos", default)]
    pub positive: VariabilityScale,
}

impl ClassScales {
    pub fn get(&self, class: Class) -> VariabilityScale {
        match class {
            Class::Negative => self.negative,
            Class::Positive => self.positive,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationSpec – one experiment's request
// ---------------------------------------------------------------------------

/// Parameters of one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSpec {
    pub n_samples_per_class: ClassCounts,
    #[serde(default)]
    pub variability_scale: ClassScales,
    pub seed: u64,
}

impl GenerationSpec {
    /// Spec with auto-estimated variability for both classes.
    pub fn new(n_negative: usize, n_positive: usize, seed: u64) -> Self {
        Self {
            n_samples_per_class: ClassCounts::new(n_negative, n_positive),
            variability_scale: ClassScales::default(),
            seed,
        }
    }

    pub fn with_scales(mut self, negative: VariabilityScale, positive: VariabilityScale) -> Self {
        self.variability_scale = ClassScales { negative, positive };
        self
    }

    /// Reject an empty request and malformed explicit scales.
    pub fn validate(&self) -> Result<()> {
        if self.n_samples_per_class.total() == 0 {
            return Err(SynthError::invalid_sample_count(
                "at least one sample must be requested across both classes",
            ));
        }
        for class in Class::ALL {
            self.variability_scale.get(class).validate(class)?;
        }
        Ok(())
    }
}
