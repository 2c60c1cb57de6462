use ndarray::{Array1, ArrayViewMut1};
use rand::Rng;
use rand_distr::StandardNormal;

use super::error::Result;
use super::profile::ClassProfile;
use super::spec::VariabilityScale;
use super::stream::{row_rng, Component, StreamTag};
use super::Class;

/// Resolve a scale to the standard deviation of the combination coefficients.
///
/// With K deviation rows, coefficients drawn with std `1/√K` give each
/// feature the empirical variance `(1/K) Σ_k B_kf²` in expectation, so
/// `Auto` resolves to `1/√K` and `Explicit(s)` to `s/√K`.
/// A class without deviation rows resolves to `0.0`.
pub fn resolve_coefficient_std(
    scale: VariabilityScale,
    class: Class,
    n_deviations: usize,
) -> Result<f64> {
    let scale = scale.validate(class)?;
    if let VariabilityScale::CoefficientStd(std) = scale {
        return Ok(std);
    }
    if n_deviations == 0 {
        return Ok(0.0);
    }
    let base = 1.0 / (n_deviations as f64).sqrt();
    Ok(match scale {
        VariabilityScale::Explicit(s) => s * base,
        _ => base,
    })
}

/// Draws biological-variability vectors as random linear combinations of a
/// class's deviation rows: `β · B` with `β ~ N(0, σ² I_K)`.
#[derive(Debug, Clone)]
pub struct VariabilitySampler<'a> {
    profile: &'a ClassProfile,
    tag: StreamTag,
    coefficient_std: f64,
    seed: u64,
}

impl<'a> VariabilitySampler<'a> {
    pub fn new(
        class: Class,
        profile: &'a ClassProfile,
        scale: VariabilityScale,
        seed: u64,
    ) -> Result<Self> {
        let coefficient_std = resolve_coefficient_std(scale, class, profile.n_deviations())?;
        Ok(Self {
            profile,
            tag: StreamTag::new(class, Component::Variability),
            coefficient_std,
            seed,
        })
    }

    /// Resolved coefficient standard deviation σ.
    pub fn coefficient_std(&self) -> f64 {
        self.coefficient_std
    }

    /// Add the variability vector of row `index` onto `out`.
    pub fn add_to(&self, index: usize, mut out: ArrayViewMut1<'_, f64>) {
        let mut rng = row_rng(self.seed, self.tag, index);
        for row in self.profile.deviations().rows() {
            let z: f64 = rng.sample(StandardNormal);
            out.scaled_add(z * self.coefficient_std, &row);
        }
    }

    /// Variability vector of row `index`.
    pub fn sample(&self, index: usize) -> Array1<f64> {
        let mut out = Array1::zeros(self.profile.n_features());
        self.add_to(index, out.view_mut());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SynthError;
    use ndarray::{array, Axis};

    fn anti_diagonal() -> ClassProfile {
        ClassProfile::new(array![0.0, 0.0], array![[1.0, -1.0], [-1.0, 1.0]]).unwrap()
    }

    #[test]
    fn auto_resolves_to_inverse_sqrt_rows() {
        let std = resolve_coefficient_std(VariabilityScale::Auto, Class::Negative, 4).unwrap();
        assert_eq!(std, 0.5);
        let std =
            resolve_coefficient_std(VariabilityScale::Explicit(3.0), Class::Negative, 4).unwrap();
        assert_eq!(std, 1.5);
        let std =
            resolve_coefficient_std(VariabilityScale::CoefficientStd(0.2), Class::Negative, 4)
                .unwrap();
        assert_eq!(std, 0.2);
        assert_eq!(
            resolve_coefficient_std(VariabilityScale::Auto, Class::Positive, 0).unwrap(),
            0.0
        );
    }

    #[test]
    fn explicit_scale_is_validated() {
        let err = VariabilitySampler::new(
            Class::Positive,
            &anti_diagonal(),
            VariabilityScale::Explicit(-2.0),
            1,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SynthError::InvalidScale {
                class: Class::Positive,
                value: -2.0
            }
        );
    }

    #[test]
    fn samples_stay_in_the_span_of_the_deviations() {
        let profile = anti_diagonal();
        let sampler =
            VariabilitySampler::new(Class::Negative, &profile, VariabilityScale::Auto, 42).unwrap();
        for index in 0..50 {
            let v = sampler.sample(index);
            assert!((v[0] + v[1]).abs() < 1e-12, "row {index} left the span: {v}");
        }
    }

    #[test]
    fn auto_matches_unit_explicit_scale_exactly() {
        let profile = anti_diagonal();
        let auto =
            VariabilitySampler::new(Class::Negative, &profile, VariabilityScale::Auto, 5).unwrap();
        let unit =
            VariabilitySampler::new(Class::Negative, &profile, VariabilityScale::Explicit(1.0), 5)
                .unwrap();
        for index in 0..10 {
            assert_eq!(auto.sample(index), unit.sample(index));
        }
    }

    #[test]
    fn unit_scale_reproduces_empirical_variance() {
        let profile = ClassProfile::new(
            array![0.0, 0.0, 0.0],
            array![[2.0, 0.5, 0.0], [-1.0, 0.5, 1.0], [-1.0, -1.0, -1.0]],
        )
        .unwrap();
        let expected = profile.empirical_variance();
        let n = 20_000;

        for scale in [1.0, 2.0] {
            let sampler = VariabilitySampler::new(
                Class::Positive,
                &profile,
                VariabilityScale::Explicit(scale),
                11,
            )
            .unwrap();
            let mut draws = ndarray::Array2::zeros((n, 3));
            for (i, row) in draws.axis_iter_mut(Axis(0)).enumerate() {
                sampler.add_to(i, row);
            }
            let variance = draws.map(|v| v * v).mean_axis(Axis(0)).unwrap();
            for f in 0..3 {
                let target = expected[f] * scale * scale;
                assert!(
                    (variance[f] - target).abs() <= 0.05 * target,
                    "feature {f}: variance {} vs target {target}",
                    variance[f]
                );
            }
        }
    }
}
