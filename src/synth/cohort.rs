use log::{debug, info};
use ndarray::parallel::prelude::*;
use ndarray::{s, Array1, Array2, ArrayView2, ArrayViewMut2, Axis};

use super::error::{Result, SynthError};
use super::noise::NoiseSampler;
use super::profile::{Calibration, ClassProfile, NoiseProfile};
use super::spec::{ClassCounts, GenerationSpec};
use super::variability::VariabilitySampler;
use super::Class;

// ---------------------------------------------------------------------------
// GeneratedCohort – labelled synthetic data matrix
// ---------------------------------------------------------------------------

/// Synthetic spectra for both classes, negatives first.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCohort {
    /// One synthetic spectrum per row, `(n_neg + n_pos) x F`.
    pub features: Array2<f64>,
    /// Class label per row: 0 for negative, 1 for positive.
    pub labels: Vec<u8>,
    counts: ClassCounts,
}

impl GeneratedCohort {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn counts(&self) -> ClassCounts {
        self.counts
    }

    /// Contiguous block of rows belonging to `class`.
    pub fn class_rows(&self, class: Class) -> ArrayView2<'_, f64> {
        let n_neg = self.counts.negative;
        match class {
            Class::Negative => self.features.slice(s![..n_neg, ..]),
            Class::Positive => self.features.slice(s![n_neg.., ..]),
        }
    }

    /// Per-feature average of the rows of `class`, `None` if it has no rows.
    pub fn class_mean(&self, class: Class) -> Option<Array1<f64>> {
        self.class_rows(class).mean_axis(Axis(0))
    }

    pub fn into_parts(self) -> (Array2<f64>, Vec<u8>) {
        (self.features, self.labels)
    }
}

// ---------------------------------------------------------------------------
// Cohort assembly
// ---------------------------------------------------------------------------

/// Everything needed to fill one class block, resolved before any allocation.
struct ClassPlan<'a> {
    n: usize,
    profile: &'a ClassProfile,
    variability: VariabilitySampler<'a>,
    noise: NoiseSampler<'a>,
}

impl ClassPlan<'_> {
    /// Row i = (variability_i + mean) + noise_i, rows filled in parallel.
    fn fill(&self, mut block: ArrayViewMut2<'_, f64>) {
        let mean = self.profile.mean();
        block
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut row)| {
                self.variability.add_to(i, row.view_mut());
                row += &mean;
                self.noise.add_to(i, row.view_mut());
            });
    }
}

/// Draw a labelled synthetic cohort from two class profiles and a noise profile.
///
/// Rows are emitted negatives first, then positives, each block in
/// generation order. The same inputs always give bit-identical output,
/// whatever the rayon thread count, and a class's rows do not depend on
/// the other class's sample count.
pub fn generate(
    negative: &ClassProfile,
    positive: &ClassProfile,
    noise: &NoiseProfile,
    spec: &GenerationSpec,
) -> Result<GeneratedCohort> {
    let calibration = Calibration::new(negative, positive, noise)?;
    spec.validate()?;

    let counts = spec.n_samples_per_class;
    let mut plans = Vec::with_capacity(Class::ALL.len());
    for class in Class::ALL {
        let n = counts.get(class);
        let profile = calibration.profile(class);
        if n > 0 && profile.n_deviations() == 0 {
            return Err(SynthError::EmptyDeviations {
                class,
                requested: n,
            });
        }
        let variability = VariabilitySampler::new(
            class,
            profile,
            spec.variability_scale.get(class),
            spec.seed,
        )?;
        debug!(
            "{class} class: {n} samples from {} deviation rows, coefficient std {:.6}",
            profile.n_deviations(),
            variability.coefficient_std()
        );
        plans.push(ClassPlan {
            n,
            profile,
            variability,
            noise: NoiseSampler::new(class, calibration.noise(), spec.seed),
        });
    }

    let mut features = Array2::zeros((counts.total(), calibration.n_features()));
    let mut offset = 0;
    for plan in &plans {
        plan.fill(features.slice_mut(s![offset..offset + plan.n, ..]));
        offset += plan.n;
    }

    let labels = Class::ALL
        .iter()
        .flat_map(|&class| std::iter::repeat(class.label()).take(counts.get(class)))
        .collect();

    info!(
        "Generated cohort: {} negative + {} positive spectra, {} features (seed {})",
        counts.negative,
        counts.positive,
        calibration.n_features(),
        spec.seed
    );

    Ok(GeneratedCohort {
        features,
        labels,
        counts,
    })
}
