//! End-to-end analysis/synthesis tests

use nsgt_lib::nsgt::{Channels, Coefficients, NSGTConfig};
use nsgt_lib::utils::reconstruction_error;
use nsgt_lib::{Complex64, NSGTError, OctScale, CQNSGT, NSGT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const FS: f64 = 44100.0;
const TOLERANCE: f64 = 1e-8;

fn random_signal(rng: &mut StdRng, ls: usize) -> Vec<f64> {
    (0..ls).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Sum of cosines sitting exactly on DFT bins
fn tones(ls: usize, frequencies: &[f64]) -> Vec<f64> {
    let bins: Vec<f64> = frequencies
        .iter()
        .map(|f| (f * ls as f64 / FS).round())
        .collect();
    (0..ls)
        .map(|n| {
            bins.iter()
                .enumerate()
                .map(|(i, k)| (2.0 * PI * k * n as f64 / ls as f64 + 0.7 * i as f64).cos())
                .sum()
        })
        .collect()
}

fn roundtrip(nsgt: &NSGT, signal: &[f64]) -> f64 {
    let coefficients = nsgt.forward_channel(signal).unwrap();
    let reconstructed: Vec<f64> = nsgt.backward_channel(&coefficients).unwrap();
    assert_eq!(reconstructed.len(), signal.len());
    reconstruction_error(signal, &reconstructed)
}

#[test]
fn test_random_parameter_roundtrip() {
    let mut rng = StdRng::seed_from_u64(42);

    for trial in 0..12 {
        let fmin = rng.random_range(1.0..=200.0);
        let fmax = rng.random_range(fmin + 1.0..=FS / 2.0);
        let bins = rng.random_range(1..=24);
        let ls = rng.random_range(1000..=100_000);

        let nsgt = CQNSGT::new(fmin, fmax, bins, NSGTConfig::new(FS, ls).unwrap()).unwrap();
        let signal = random_signal(&mut rng, ls);
        let error = roundtrip(&nsgt, &signal);
        assert!(
            error < TOLERANCE,
            "trial {}: fmin {:.2}, fmax {:.2}, bins {}, ls {}: error {:e}",
            trial,
            fmin,
            fmax,
            bins,
            ls,
            error
        );
    }
}

#[test]
fn test_scale_up_to_nyquist() {
    let mut rng = StdRng::seed_from_u64(37);

    for (bins, ls) in [(1, 2048), (12, 4410), (24, 9999)] {
        let nsgt =
            CQNSGT::new(50.0, FS / 2.0, bins, NSGTConfig::new(FS, ls).unwrap()).unwrap();
        assert!(nsgt.frequencies().iter().all(|&f| f > 0.0 && f < FS / 2.0));

        let error = roundtrip(&nsgt, &random_signal(&mut rng, ls));
        assert!(error < TOLERANCE, "bins {}, ls {}: error {:e}", bins, ls, error);
    }
}

#[test]
fn test_long_signal_roundtrip() {
    let mut rng = StdRng::seed_from_u64(41);
    let ls = 50_000;
    let nsgt = CQNSGT::new(30.0, 20000.0, 24, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    assert_eq!(nsgt.nn(), ls);
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);
}

#[test]
fn test_odd_signal_length() {
    let mut rng = StdRng::seed_from_u64(7);
    let ls = 4001;
    let nsgt = CQNSGT::new(60.0, 15000.0, 12, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);
}

#[test]
fn test_complex_signal_roundtrip() {
    let mut rng = StdRng::seed_from_u64(3);
    let ls = 5000;
    let config = NSGTConfig::new(FS, ls).unwrap().with_real(false);
    let nsgt = CQNSGT::new(40.0, 18000.0, 16, config).unwrap();
    assert_eq!(nsgt.kept_bands(), 0..nsgt.num_bands());

    let signal: Vec<Complex64> = (0..ls)
        .map(|_| Complex64::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)))
        .collect();

    let coefficients = nsgt.forward_channel(&signal).unwrap();
    assert_eq!(coefficients.num_bands(), nsgt.num_bands());
    let reconstructed: Vec<Complex64> = nsgt.backward_channel(&coefficients).unwrap();
    assert!(reconstruction_error(&signal, &reconstructed) < TOLERANCE);
}

#[test]
fn test_real_signal_in_complex_mode() {
    let mut rng = StdRng::seed_from_u64(5);
    let ls = 3000;
    let config = NSGTConfig::new(FS, ls).unwrap().with_real(false);
    let nsgt = CQNSGT::new(100.0, 10000.0, 6, config).unwrap();
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);
}

#[test]
fn test_matrix_form_roundtrip() {
    let mut rng = StdRng::seed_from_u64(11);
    let ls = 6000;
    let config = NSGTConfig::new(FS, ls).unwrap().with_matrix_form(true);
    let nsgt = CQNSGT::new(50.0, 12000.0, 12, config).unwrap();

    let uniform = nsgt.bin_counts()[0];
    assert!(nsgt.bin_counts().iter().all(|&m| m == uniform));
    assert_eq!(uniform, nsgt.windows().iter().map(Vec::len).max().unwrap());

    let signal = random_signal(&mut rng, ls);
    let coefficients = nsgt.forward_channel(&signal).unwrap();
    match &coefficients {
        Coefficients::Matrix(matrix) => {
            assert_eq!(matrix.rows(), nsgt.kept_bands().len());
            assert_eq!(matrix.cols(), uniform);
        }
        Coefficients::Ragged(_) => panic!("matrix form should produce a matrix"),
    }

    let reconstructed: Vec<f64> = nsgt.backward_channel(&coefficients).unwrap();
    assert!(reconstruction_error(&signal, &reconstructed) < TOLERANCE);
}

#[test]
fn test_reduced_forms_roundtrip() {
    let ls = 8192;
    // well inside the retained bands for every reduced form
    let signal = tones(ls, &[200.0, 1000.0, 5000.0]);

    for matrix_form in [false, true] {
        for reduced_form in 0..=2 {
            let config = NSGTConfig::new(FS, ls)
                .unwrap()
                .with_matrix_form(matrix_form)
                .with_reduced_form(reduced_form);
            let nsgt = CQNSGT::new(50.0, 10000.0, 12, config).unwrap();

            let half = nsgt.num_bands() / 2 + 1;
            assert_eq!(nsgt.kept_bands(), reduced_form..half - reduced_form);

            if matrix_form {
                let retained = &nsgt.bin_counts()[reduced_form..half - reduced_form];
                let uniform = nsgt.bin_counts()[0];
                assert!(retained.iter().all(|&m| m == uniform));
            }

            let error = roundtrip(&nsgt, &signal);
            assert!(
                error < TOLERANCE,
                "matrix {} reduced {}: error {:e}",
                matrix_form,
                reduced_form,
                error
            );
        }
    }
}

#[test]
fn test_reduced_form_ignored_for_complex_mode() {
    let mut rng = StdRng::seed_from_u64(13);
    let ls = 2000;
    let config = NSGTConfig::new(FS, ls)
        .unwrap()
        .with_real(false)
        .with_reduced_form(2);
    let nsgt = CQNSGT::new(100.0, 8000.0, 8, config).unwrap();
    assert_eq!(nsgt.kept_bands(), 0..nsgt.num_bands());
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);
}

#[test]
fn test_multichannel_matches_single() {
    let mut rng = StdRng::seed_from_u64(17);
    let ls = 2500;
    let channels: Vec<Vec<f64>> = (0..3).map(|_| random_signal(&mut rng, ls)).collect();

    let single = CQNSGT::new(80.0, 9000.0, 10, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    let multi = CQNSGT::new(
        80.0,
        9000.0,
        10,
        NSGTConfig::new(FS, ls).unwrap().with_multichannel(true),
    )
    .unwrap();

    let coefficients = multi.forward(&Channels::Multi(channels.clone())).unwrap();
    assert_eq!(coefficients.len(), 3);

    for (channel, c) in channels.iter().zip(coefficients.as_slice()) {
        let expected = single.forward(&Channels::Single(channel.clone())).unwrap();
        assert_eq!(expected.into_single().as_ref(), Some(c));
    }

    let reconstructed: Channels<Vec<f64>> = multi.backward(&coefficients).unwrap();
    for (x, y) in channels.iter().zip(reconstructed.as_slice()) {
        assert!(reconstruction_error(x, y) < TOLERANCE);
    }

    // layouts must match the configuration
    assert!(matches!(
        single.forward(&Channels::Multi(channels.clone())),
        Err(NSGTError::ShapeMismatch(_))
    ));
    assert!(matches!(
        multi.forward(&Channels::Single(channels[0].clone())),
        Err(NSGTError::ShapeMismatch(_))
    ));
}

#[test]
fn test_forward_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(19);
    let ls = 3333;
    let signal = random_signal(&mut rng, ls);

    let make = || CQNSGT::new(70.0, 11000.0, 9, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    let a = make().forward_channel(&signal).unwrap();
    let b = make().forward_channel(&signal).unwrap();
    assert_eq!(a, b);

    let nsgt = make();
    assert_eq!(
        nsgt.forward_channel(&signal).unwrap(),
        nsgt.forward_channel(&signal).unwrap()
    );
}

#[test]
fn test_parameter_validation() {
    let config = NSGTConfig::default();
    let invalid = |result: Result<CQNSGT, NSGTError>| {
        matches!(result, Err(NSGTError::InvalidParameter(_)))
    };

    assert!(invalid(CQNSGT::new(0.0, 1000.0, 12, config)));
    assert!(invalid(CQNSGT::new(-10.0, 1000.0, 12, config)));
    assert!(invalid(CQNSGT::new(1000.0, 500.0, 12, config)));
    assert!(invalid(CQNSGT::new(1000.0, 1000.0, 12, config)));
    assert!(invalid(CQNSGT::new(100.0, 1000.0, 0, config)));

    let bad_fs = NSGTConfig { fs: -1.0, ..config };
    assert!(invalid(CQNSGT::new(100.0, 1000.0, 12, bad_fs)));
    let bad_ls = NSGTConfig { ls: 0, ..config };
    assert!(invalid(CQNSGT::new(100.0, 1000.0, 12, bad_ls)));
    assert!(invalid(CQNSGT::new(
        100.0,
        1000.0,
        12,
        config.with_reduced_form(3)
    )));

    // every frequency at or above Nyquist
    assert!(invalid(CQNSGT::new(30000.0, 40000.0, 12, config)));
}

#[test]
fn test_single_bin_per_octave() {
    let mut rng = StdRng::seed_from_u64(23);
    let ls = 4096;
    let nsgt = CQNSGT::new(100.0, 6000.0, 1, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    assert_eq!(nsgt.frequencies().len(), 7);
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);
}

#[test]
fn test_minimum_signal_length() {
    let ls = 4;
    let nsgt = CQNSGT::new(1000.0, 10000.0, 1, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    assert_eq!(nsgt.nn(), ls);

    let signal = vec![0.5, -1.0, 0.25, 2.0];
    assert!(roundtrip(&nsgt, &signal) < TOLERANCE);
}

#[test]
fn test_custom_scale() {
    use nsgt_lib::Scale;

    /// Linearly spaced bands
    struct LinScale;

    impl Scale for LinScale {
        fn len(&self) -> usize {
            20
        }

        fn frequency(&self, band: f64) -> f64 {
            500.0 + 1000.0 * band
        }
    }

    let mut rng = StdRng::seed_from_u64(29);
    let ls = 2205;
    let nsgt = NSGT::new(&LinScale, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    assert_eq!(nsgt.frequencies().len(), 20);
    assert!(roundtrip(&nsgt, &random_signal(&mut rng, ls)) < TOLERANCE);

    let oct = OctScale::new(100.0, 1000.0, 4).unwrap();
    assert!(NSGT::new(&oct, NSGTConfig::new(FS, ls).unwrap()).is_ok());
}

#[test]
fn test_measure_fft_does_not_change_output() {
    let mut rng = StdRng::seed_from_u64(31);
    let ls = 2048;
    let signal = random_signal(&mut rng, ls);

    let plain = CQNSGT::new(60.0, 16000.0, 12, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    let measured = CQNSGT::new(
        60.0,
        16000.0,
        12,
        NSGTConfig::new(FS, ls).unwrap().with_measure_fft(true),
    )
    .unwrap();

    let a = plain.forward_channel(&signal).unwrap();
    let b = measured.forward_channel(&signal).unwrap();
    assert_eq!(a, b);
    assert!(plain.fft_timings().is_empty());
    assert!(!measured.fft_timings().is_empty());
}

#[test]
fn test_energy_concentrates_at_tone() {
    let ls = 8192;
    let nsgt = CQNSGT::new(50.0, 10000.0, 12, NSGTConfig::new(FS, ls).unwrap()).unwrap();
    let coefficients = nsgt.forward_channel(&tones(ls, &[1000.0])).unwrap();

    let loudest = coefficients
        .bands()
        .map(|band| band.iter().map(|c| c.norm_sqr()).sum::<f64>())
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
        .unwrap();
    let centre = nsgt.band_frequency(nsgt.kept_bands().start + loudest);
    assert!((centre / 1000.0).log2().abs() < 1.0 / 12.0, "loudest band at {} Hz", centre);
}
