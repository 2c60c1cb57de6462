use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::error::{Result, SynthError};
use super::Class;

// ---------------------------------------------------------------------------
// ClassProfile – mean spectrum plus empirical deviation vectors
// ---------------------------------------------------------------------------

/// Per-class summary of real spectra: the class mean and the residuals of
/// K real samples from that mean (one row per sample, one column per feature).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProfile {
    mean: Array1<f64>,
    deviations: Array2<f64>,
}

impl ClassProfile {
    /// Build a profile, checking that every deviation row spans the mean's features.
    ///
    /// A deviation matrix without rows is accepted here; it only becomes an
    /// error once samples are requested for the class.
    pub fn new(mean: Array1<f64>, deviations: Array2<f64>) -> Result<Self> {
        let n_features = mean.len();
        let deviations = if deviations.nrows() == 0 {
            Array2::zeros((0, n_features))
        } else {
            deviations
        };
        if deviations.ncols() != n_features {
            return Err(SynthError::dimension_mismatch(
                "deviation columns",
                n_features,
                deviations.ncols(),
            ));
        }
        Ok(Self { mean, deviations })
    }

    /// Build a profile from plain vectors, as produced by most data loaders.
    pub fn from_rows(mean: Vec<f64>, rows: &[Vec<f64>]) -> Result<Self> {
        let n_features = mean.len();
        let mut flat = Vec::with_capacity(rows.len() * n_features);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(SynthError::dimension_mismatch(
                    format!("deviation row {i}"),
                    n_features,
                    row.len(),
                ));
            }
            flat.extend_from_slice(row);
        }
        let deviations = Array2::from_shape_vec((rows.len(), n_features), flat).map_err(|_| {
            SynthError::dimension_mismatch("deviation matrix", n_features, rows.len())
        })?;
        Self::new(Array1::from(mean), deviations)
    }

    /// Mean spectrum.
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    /// Deviation vectors, one per row.
    pub fn deviations(&self) -> ArrayView2<'_, f64> {
        self.deviations.view()
    }

    /// Number of spectral features (F).
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Number of deviation vectors (K).
    pub fn n_deviations(&self) -> usize {
        self.deviations.nrows()
    }

    /// Per-feature variance of the deviation rows, `(1/K) Σ_k B_kf²`.
    ///
    /// Returns zeros when there are no rows.
    pub fn empirical_variance(&self) -> Array1<f64> {
        let k = self.n_deviations();
        if k == 0 {
            return Array1::zeros(self.n_features());
        }
        self.deviations
            .map(|v| v * v)
            .sum_axis(ndarray::Axis(0))
            / k as f64
    }
}

// ---------------------------------------------------------------------------
// NoiseProfile – per-feature measurement noise
// ---------------------------------------------------------------------------

/// Standard deviation of additive instrument noise for each feature.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    std: Array1<f64>,
}

impl NoiseProfile {
    /// Build a noise profile; every entry must be finite and non-negative.
    pub fn new(std: Array1<f64>) -> Result<Self> {
        if let Some((feature, &value)) = std
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(SynthError::InvalidNoiseStd { feature, value });
        }
        Ok(Self { std })
    }

    /// Same standard deviation on every feature.
    pub fn uniform(n_features: usize, std: f64) -> Result<Self> {
        Self::new(Array1::from_elem(n_features, std))
    }

    /// Noise-free profile.
    pub fn zeros(n_features: usize) -> Self {
        Self {
            std: Array1::zeros(n_features),
        }
    }

    /// Per-feature standard deviation.
    pub fn std(&self) -> ArrayView1<'_, f64> {
        self.std.view()
    }

    /// Number of spectral features (F).
    pub fn n_features(&self) -> usize {
        self.std.len()
    }
}

// ---------------------------------------------------------------------------
// Calibration – validated read-only view over both classes and the noise
// ---------------------------------------------------------------------------

/// Borrowed view over two class profiles and a noise profile that all share
/// one feature axis.
#[derive(Debug, Clone, Copy)]
pub struct Calibration<'a> {
    negative: &'a ClassProfile,
    positive: &'a ClassProfile,
    noise: &'a NoiseProfile,
}

impl<'a> Calibration<'a> {
    /// Check feature-dimension consistency across all three inputs.
    ///
    /// The negative class mean fixes the reference axis length F.
    pub fn new(
        negative: &'a ClassProfile,
        positive: &'a ClassProfile,
        noise: &'a NoiseProfile,
    ) -> Result<Self> {
        let n_features = negative.n_features();
        let checks = [
            ("negative deviation columns", negative.deviations.ncols()),
            ("positive mean", positive.n_features()),
            ("positive deviation columns", positive.deviations.ncols()),
            ("noise std", noise.n_features()),
        ];
        for (what, found) in checks {
            if found != n_features {
                return Err(SynthError::dimension_mismatch(what, n_features, found));
            }
        }
        Ok(Self {
            negative,
            positive,
            noise,
        })
    }

    /// Profile of the given class.
    pub fn profile(&self, class: Class) -> &'a ClassProfile {
        match class {
            Class::Negative => self.negative,
            Class::Positive => self.positive,
        }
    }

    /// Shared noise profile.
    pub fn noise(&self) -> &'a NoiseProfile {
        self.noise
    }

    /// Shared feature count F.
    pub fn n_features(&self) -> usize {
        self.negative.n_features()
    }
}
