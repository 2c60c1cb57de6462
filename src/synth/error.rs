use thiserror::Error;

use super::Class;

/// Result type alias for cohort synthesis.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors raised while validating calibration inputs or generating a cohort.
///
/// Every variant is fatal to the call that produced it; no partially
/// generated cohort is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// Feature-length disagreement among means, deviation rows and noise std.
    #[error("dimension mismatch in {what}: expected {expected} features, found {found}")]
    DimensionMismatch {
        /// Which input disagreed with the shared feature axis
        what: String,
        /// Feature count of the reference axis
        expected: usize,
        /// Feature count actually supplied
        found: usize,
    },

    /// Samples were requested for a class whose deviation matrix has no rows.
    #[error("{class} class has no deviation vectors but {requested} samples were requested")]
    EmptyDeviations {
        /// Class with the empty calibration matrix
        class: Class,
        /// Number of samples requested for that class
        requested: usize,
    },

    /// Negative or degenerate sample counts.
    #[error("invalid sample count: {reason}")]
    InvalidSampleCount {
        /// Why the request was rejected
        reason: String,
    },

    /// Explicit variability scale that is not a finite positive number.
    #[error("invalid variability scale for {class} class: {value}")]
    InvalidScale {
        /// Class the scale was supplied for
        class: Class,
        /// Offending value
        value: f64,
    },

    /// Noise standard deviation that is negative or not finite.
    #[error("invalid noise std at feature {feature}: {value}")]
    InvalidNoiseStd {
        /// Index of the offending feature
        feature: usize,
        /// Offending value
        value: f64,
    },
}

impl SynthError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Create an invalid sample count error
    pub fn invalid_sample_count(reason: impl Into<String>) -> Self {
        Self::InvalidSampleCount {
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the dimension-mismatch family.
    ///
    /// An empty deviation matrix for a requested class counts as one.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::EmptyDeviations { .. }
        )
    }
}
