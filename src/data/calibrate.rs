use anyhow::{bail, Context, Result};
use log::info;
use ndarray::{Array2, ArrayView1, Axis};

use super::filter::{selected_indices, Selection};
use super::model::SpectralDataset;
use crate::synth::{ClassProfile, NoiseProfile};

/// Largest absolute wavenumber difference still treated as the same axis.
const AXIS_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// SpectraBlock – spectra stacked on one shared axis
// ---------------------------------------------------------------------------

/// Intensities of several spectra that share one wavenumber axis.
#[derive(Debug, Clone)]
pub struct SpectraBlock {
    pub wavenumbers: Vec<f64>,
    /// One spectrum per row.
    pub intensities: Array2<f64>,
}

impl SpectraBlock {
    /// Stack the spectra at `indices`, checking they share one axis.
    pub fn collect(dataset: &SpectralDataset, indices: &[usize]) -> Result<Self> {
        let Some(&first) = indices.first() else {
            bail!("No spectra selected");
        };
        let wavenumbers = dataset.spectra[first].x.clone();
        let n_features = wavenumbers.len();

        let mut intensities = Array2::zeros((indices.len(), n_features));
        for (mut row, &idx) in intensities.axis_iter_mut(Axis(0)).zip(indices) {
            let sp = &dataset.spectra[idx];
            check_axis(&wavenumbers, &sp.x).with_context(|| format!("spectrum {idx}"))?;
            if sp.y.len() != n_features {
                bail!(
                    "spectrum {idx}: {} intensities for {n_features} wavenumbers",
                    sp.y.len()
                );
            }
            row.assign(&ArrayView1::from(&sp.y[..]));
        }
        Ok(Self {
            wavenumbers,
            intensities,
        })
    }

    /// Stack the spectra matching `selection`.
    pub fn select(dataset: &SpectralDataset, selection: &Selection) -> Result<Self> {
        let indices = selected_indices(dataset, selection);
        Self::collect(dataset, &indices).with_context(|| format!("selection {selection:?}"))
    }

    pub fn len(&self) -> usize {
        self.intensities.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.nrows() == 0
    }

    /// Mean spectrum and residuals of each row from it.
    pub fn class_profile(&self) -> Result<ClassProfile> {
        let mean = self
            .intensities
            .mean_axis(Axis(0))
            .context("cannot build a class profile from zero spectra")?;
        let deviations = &self.intensities - &mean;
        Ok(ClassProfile::new(mean, deviations)?)
    }

    /// Per-feature sample standard deviation (ddof = 1) of repeated blanks.
    pub fn noise_profile(&self) -> Result<NoiseProfile> {
        if self.len() < 2 {
            bail!(
                "need at least 2 blank spectra to estimate noise, got {}",
                self.len()
            );
        }
        let std = self.intensities.std_axis(Axis(0), 1.0);
        Ok(NoiseProfile::new(std)?)
    }
}

fn check_axis(reference: &[f64], x: &[f64]) -> Result<()> {
    if reference.len() != x.len() {
        bail!(
            "wavenumber axis has {} points, expected {}",
            x.len(),
            reference.len()
        );
    }
    if let Some((i, (a, b))) = reference
        .iter()
        .zip(x)
        .enumerate()
        .find(|(_, (a, b))| (*a - *b).abs() > AXIS_TOLERANCE)
    {
        bail!("wavenumber {i} is {b}, expected {a}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CalibrationData – everything `generate` consumes, on one axis
// ---------------------------------------------------------------------------

/// Where the measurement noise profile comes from.
#[derive(Debug, Clone)]
pub enum NoiseSource {
    /// Repeated blank measurements selected from the dataset.
    Blanks(Selection),
    /// Same std on every feature.
    Uniform(f64),
}

/// Class and noise profiles estimated from one dataset.
#[derive(Debug, Clone)]
pub struct CalibrationData {
    pub wavenumbers: Vec<f64>,
    pub negative: ClassProfile,
    pub positive: ClassProfile,
    pub noise: NoiseProfile,
}

/// Estimate both class profiles and the noise profile from `dataset`.
pub fn calibrate(
    dataset: &SpectralDataset,
    negative: &Selection,
    positive: &Selection,
    noise: &NoiseSource,
) -> Result<CalibrationData> {
    let neg_block = SpectraBlock::select(dataset, negative).context("negative class")?;
    let pos_block = SpectraBlock::select(dataset, positive).context("positive class")?;
    check_axis(&neg_block.wavenumbers, &pos_block.wavenumbers)
        .context("positive class axis differs from negative class axis")?;

    let noise = match noise {
        NoiseSource::Blanks(selection) => {
            let blanks = SpectraBlock::select(dataset, selection).context("blank spectra")?;
            check_axis(&neg_block.wavenumbers, &blanks.wavenumbers)
                .context("blank axis differs from negative class axis")?;
            blanks.noise_profile()?
        }
        NoiseSource::Uniform(std) => NoiseProfile::uniform(neg_block.wavenumbers.len(), *std)?,
    };

    info!(
        "Calibrated {} negative and {} positive spectra on {} wavenumbers",
        neg_block.len(),
        pos_block.len(),
        neg_block.wavenumbers.len()
    );

    Ok(CalibrationData {
        negative: neg_block.class_profile()?,
        positive: pos_block.class_profile()?,
        noise,
        wavenumbers: neg_block.wavenumbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::select_equal;
    use crate::data::model::{MetadataValue, Spectrum};
    use std::collections::BTreeMap;

    fn spectrum(class: &str, x: Vec<f64>, y: Vec<f64>) -> Spectrum {
        Spectrum {
            x,
            y,
            metadata: BTreeMap::from([("class".to_string(), MetadataValue::infer(class))]),
        }
    }

    fn by_class(class: &str) -> Selection {
        select_equal("class", MetadataValue::infer(class))
    }

    #[test]
    fn class_profile_is_mean_plus_residuals() {
        let ds = SpectralDataset::from_spectra(vec![
            spectrum("case", vec![1.0, 2.0], vec![1.0, 4.0]),
            spectrum("case", vec![1.0, 2.0], vec![3.0, 0.0]),
        ]);
        let profile = SpectraBlock::select(&ds, &by_class("case"))
            .unwrap()
            .class_profile()
            .unwrap();
        assert_eq!(profile.mean(), ndarray::array![2.0, 2.0]);
        assert_eq!(
            profile.deviations(),
            ndarray::array![[-1.0, 2.0], [1.0, -2.0]]
        );
    }

    #[test]
    fn noise_profile_uses_sample_std() {
        let ds = SpectralDataset::from_spectra(vec![
            spectrum("blank", vec![1.0, 2.0], vec![1.0, 5.0]),
            spectrum("blank", vec![1.0, 2.0], vec![3.0, 5.0]),
        ]);
        let block = SpectraBlock::select(&ds, &by_class("blank")).unwrap();
        let noise = block.noise_profile().unwrap();
        assert!((noise.std()[0] - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(noise.std()[1], 0.0);

        let single = SpectraBlock::collect(&ds, &[0]).unwrap();
        assert!(single.noise_profile().is_err());
    }

    #[test]
    fn rejects_mismatched_axes_and_empty_selections() {
        let ds = SpectralDataset::from_spectra(vec![
            spectrum("case", vec![1.0, 2.0], vec![1.0, 4.0]),
            spectrum("case", vec![1.0, 2.5], vec![3.0, 0.0]),
            spectrum("control", vec![1.0, 2.0], vec![0.0, 0.0]),
        ]);
        assert!(SpectraBlock::select(&ds, &by_class("case")).is_err());
        assert!(SpectraBlock::select(&ds, &by_class("blank")).is_err());
    }

    #[test]
    fn calibrate_builds_consistent_profiles() {
        let ds = SpectralDataset::from_spectra(vec![
            spectrum("control", vec![1.0, 2.0], vec![0.0, 1.0]),
            spectrum("control", vec![1.0, 2.0], vec![2.0, 1.0]),
            spectrum("case", vec![1.0, 2.0], vec![5.0, 5.0]),
            spectrum("case", vec![1.0, 2.0], vec![7.0, 3.0]),
        ]);
        let data = calibrate(
            &ds,
            &by_class("control"),
            &by_class("case"),
            &NoiseSource::Uniform(0.05),
        )
        .unwrap();
        assert_eq!(data.wavenumbers, vec![1.0, 2.0]);
        assert_eq!(data.negative.mean(), ndarray::array![1.0, 1.0]);
        assert_eq!(data.positive.mean(), ndarray::array![6.0, 4.0]);
        assert_eq!(data.noise.std(), ndarray::array![0.05, 0.05]);
    }
}
