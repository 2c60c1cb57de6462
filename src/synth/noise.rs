use ndarray::{Array1, ArrayViewMut1, Zip};
use rand::Rng;
use rand_distr::StandardNormal;

use super::profile::NoiseProfile;
use super::stream::{row_rng, Component, StreamTag};
use super::Class;

/// Draws diagonal Gaussian measurement noise, `z_f · std_f` per feature.
///
/// One standard normal is drawn for every feature, including zero-variance
/// ones, so a feature's noise depends only on the row generator and its own
/// std. Zero-variance features contribute exactly zero.
#[derive(Debug, Clone)]
pub struct NoiseSampler<'a> {
    profile: &'a NoiseProfile,
    tag: StreamTag,
    seed: u64,
}

impl<'a> NoiseSampler<'a> {
    pub fn new(class: Class, profile: &'a NoiseProfile, seed: u64) -> Self {
        Self {
            profile,
            tag: StreamTag::new(class, Component::Noise),
            seed,
        }
    }

    /// Add the noise vector of row `index` onto `out`.
    pub fn add_to(&self, index: usize, out: ArrayViewMut1<'_, f64>) {
        let mut rng = row_rng(self.seed, self.tag, index);
        Zip::from(out)
            .and(&self.profile.std())
            .for_each(|value, &std| {
                let z: f64 = rng.sample(StandardNormal);
                *value += z * std;
            });
    }

    /// Noise vector of row `index`.
    pub fn sample(&self, index: usize) -> Array1<f64> {
        let mut out = Array1::zeros(self.profile.n_features());
        self.add_to(index, out.view_mut());
        out
    }
}
