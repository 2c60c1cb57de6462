use ndarray::{array, s, Array1, Array2, Axis};

use specsynth::synth::{
    generate, Class, ClassProfile, GenerationSpec, NoiseProfile, SynthError, VariabilityScale,
    VariabilitySampler,
};

/// Three-feature profiles with a realistic absorbance scale (~100).
fn realistic() -> (ClassProfile, ClassProfile, NoiseProfile) {
    let neg = ClassProfile::new(
        array![100.0, 50.0, 80.0],
        array![
            [1.0, -0.5, 0.2],
            [-0.4, 0.8, -1.1],
            [0.3, 0.1, 0.6],
            [-0.9, -0.4, 0.3],
        ],
    )
    .unwrap();
    let pos = ClassProfile::new(
        array![110.0, 45.0, 85.0],
        array![[1.5, 0.0, -0.5], [-1.5, 0.7, 0.5], [0.0, -0.7, 0.0]],
    )
    .unwrap();
    let noise = NoiseProfile::new(array![0.5, 0.0, 0.25]).unwrap();
    (neg, pos, noise)
}

#[test]
fn shape_and_label_layout() {
    let (neg, pos, noise) = realistic();
    for (n_neg, n_pos) in [(1, 0), (0, 1), (7, 3), (5, 5)] {
        let cohort = generate(&neg, &pos, &noise, &GenerationSpec::new(n_neg, n_pos, 1)).unwrap();
        assert_eq!(cohort.features.dim(), (n_neg + n_pos, 3));
        assert_eq!(cohort.labels.len(), n_neg + n_pos);
        assert_eq!(cohort.labels.iter().filter(|&&l| l == 0).count(), n_neg);
        assert_eq!(cohort.labels.iter().filter(|&&l| l == 1).count(), n_pos);
        assert!(cohort.labels.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[test]
fn identical_arguments_give_identical_cohorts() {
    let (neg, pos, noise) = realistic();
    let spec = GenerationSpec::new(40, 25, 1234)
        .with_scales(VariabilityScale::Explicit(1.3), VariabilityScale::Auto);
    let a = generate(&neg, &pos, &noise, &spec).unwrap();
    let b = generate(&neg, &pos, &noise, &spec).unwrap();
    assert_eq!(a, b);
}

#[test]
fn output_does_not_depend_on_thread_count() {
    let (neg, pos, noise) = realistic();
    let spec = GenerationSpec::new(64, 64, 99);
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| generate(&neg, &pos, &noise, &spec).unwrap());
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| generate(&neg, &pos, &noise, &spec).unwrap());
    assert_eq!(single.features, many.features);
}

#[test]
fn different_seeds_give_different_features() {
    let (neg, pos, noise) = realistic();
    let a = generate(&neg, &pos, &noise, &GenerationSpec::new(10, 10, 1)).unwrap();
    let b = generate(&neg, &pos, &noise, &GenerationSpec::new(10, 10, 2)).unwrap();
    assert_eq!(a.labels, b.labels);
    assert_ne!(a.features, b.features);
    for (ra, rb) in a.features.rows().into_iter().zip(b.features.rows()) {
        assert_ne!(ra, rb);
    }
}

#[test]
fn changing_one_class_count_leaves_the_other_block_untouched() {
    let (neg, pos, noise) = realistic();
    let base = generate(&neg, &pos, &noise, &GenerationSpec::new(12, 5, 77)).unwrap();

    let more_pos = generate(&neg, &pos, &noise, &GenerationSpec::new(12, 50, 77)).unwrap();
    assert_eq!(
        base.class_rows(Class::Negative),
        more_pos.class_rows(Class::Negative)
    );

    let no_pos = generate(&neg, &pos, &noise, &GenerationSpec::new(12, 0, 77)).unwrap();
    assert_eq!(base.class_rows(Class::Negative), no_pos.features);

    // Positive rows are keyed by their class-local index, so a prefix survives too.
    let more_neg = generate(&neg, &pos, &noise, &GenerationSpec::new(30, 5, 77)).unwrap();
    assert_eq!(
        base.class_rows(Class::Positive),
        more_neg.class_rows(Class::Positive)
    );

    // Growing a class only appends rows to its block.
    assert_eq!(
        base.class_rows(Class::Positive),
        more_pos.class_rows(Class::Positive).slice(s![..5, ..])
    );
}

#[test]
fn zero_noise_leaves_mean_plus_variability_exactly() {
    let (neg, pos, _) = realistic();
    let noise = NoiseProfile::zeros(3);
    let spec = GenerationSpec::new(15, 15, 5);
    let cohort = generate(&neg, &pos, &noise, &spec).unwrap();

    for (class, profile) in [(Class::Negative, &neg), (Class::Positive, &pos)] {
        let sampler = VariabilitySampler::new(class, profile, VariabilityScale::Auto, 5).unwrap();
        for (i, row) in cohort.class_rows(class).rows().into_iter().enumerate() {
            let expected: Array1<f64> = &profile.mean() + &sampler.sample(i);
            assert_eq!(row, expected, "{class} row {i}");
        }
    }
}

#[test]
fn class_means_converge_to_profile_means() {
    let (neg, pos, noise) = realistic();
    let cohort = generate(&neg, &pos, &noise, &GenerationSpec::new(10_000, 10_000, 2024)).unwrap();
    let signal_scale = 100.0;

    for (class, profile) in [(Class::Negative, &neg), (Class::Positive, &pos)] {
        let mean = cohort.class_mean(class).unwrap();
        let worst = (&mean - &profile.mean())
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        assert!(
            worst < 0.01 * signal_scale,
            "{class}: max deviation {worst} from profile mean"
        );
    }
}

#[test]
fn explicit_scale_multiplies_spread() {
    let (neg, pos, _) = realistic();
    let noise = NoiseProfile::zeros(3);
    let spread = |scale: f64| -> Array1<f64> {
        let spec = GenerationSpec::new(20_000, 1, 3)
            .with_scales(VariabilityScale::Explicit(scale), VariabilityScale::Auto);
        let cohort = generate(&neg, &pos, &noise, &spec).unwrap();
        cohort.class_rows(Class::Negative).std_axis(Axis(0), 0.0)
    };
    let unit = spread(1.0);
    let triple = spread(3.0);
    let empirical = neg.empirical_variance().mapv(f64::sqrt);
    for f in 0..3 {
        assert!((unit[f] - empirical[f]).abs() < 0.05 * empirical[f], "feature {f}");
        assert!((triple[f] / unit[f] - 3.0).abs() < 0.15, "feature {f}");
    }
}

#[test]
fn two_by_two_reference_scenario() {
    let neg = ClassProfile::from_rows(vec![0.0, 0.0], &[vec![1.0, -1.0], vec![-1.0, 1.0]]).unwrap();
    let pos = ClassProfile::from_rows(vec![5.0, 5.0], &[vec![1.0, 1.0], vec![-1.0, -1.0]]).unwrap();
    let noise = NoiseProfile::zeros(2);
    let spec = GenerationSpec::new(2, 2, 42)
        .with_scales(VariabilityScale::Explicit(1.0), VariabilityScale::Explicit(1.0));

    let cohort = generate(&neg, &pos, &noise, &spec).unwrap();
    assert_eq!(cohort.features.dim(), (4, 2));
    assert_eq!(cohort.labels, vec![0, 0, 1, 1]);
    for row in cohort.class_rows(Class::Negative).rows() {
        assert!((row[0] + row[1]).abs() < 1e-12, "{row} not on span of [1,-1]");
    }
    for row in cohort.class_rows(Class::Positive).rows() {
        assert!((row[0] - row[1]).abs() < 1e-12, "{row} not on [5,5] + span of [1,1]");
    }
}

#[test]
fn errors_leave_no_partial_cohort() {
    let (neg, pos, noise) = realistic();

    let err = generate(&neg, &pos, &noise, &GenerationSpec::new(0, 0, 1)).unwrap_err();
    assert!(matches!(err, SynthError::InvalidSampleCount { .. }));

    let spec = GenerationSpec::new(3, 3, 1)
        .with_scales(VariabilityScale::Auto, VariabilityScale::Explicit(0.0));
    let err = generate(&neg, &pos, &noise, &spec).unwrap_err();
    assert_eq!(
        err,
        SynthError::InvalidScale {
            class: Class::Positive,
            value: 0.0
        }
    );

    let wide_noise = NoiseProfile::zeros(4);
    let err = generate(&neg, &pos, &wide_noise, &GenerationSpec::new(3, 3, 1)).unwrap_err();
    assert_eq!(err, SynthError::dimension_mismatch("noise std", 3, 4));

    let empty = ClassProfile::new(array![1.0, 1.0, 1.0], Array2::zeros((0, 3))).unwrap();
    let err = generate(&empty, &pos, &noise, &GenerationSpec::new(1, 3, 1)).unwrap_err();
    assert!(err.is_dimension_mismatch());
}
