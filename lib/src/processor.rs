//! Main NSGT processor implementation
//!
//! Provides the [`NSGT`] struct that builds a frame once for a fixed signal
//! length and applies the forward and backward transforms to one or many
//! channels, and [`CQNSGT`], its constant-Q form on a geometric scale.

use crate::error::NSGTError;
use crate::nsgt::design::{apply_matrix_form, design_windows};
use crate::nsgt::dual::compute_dual_windows;
use crate::nsgt::placement::calc_window_ranges;
use crate::nsgt::{
    Channels, Coefficients, FftBank, FftTiming, FrameSet, NSGTAnalyzer, NSGTConfig,
    NSGTSynthesizer, Placement, Sample,
};
use crate::scale::{OctScale, Scale};
use crate::Result;
use std::ops::{Deref, Range};
use std::sync::Arc;

/// Non-stationary Gabor transform for a fixed sample rate and signal length
pub struct NSGT {
    config: NSGTConfig,
    frame: Arc<FrameSet>,
    ffts: Arc<FftBank>,
    analyzer: NSGTAnalyzer,
    synthesizer: NSGTSynthesizer,
}

impl NSGT {
    /// Build the transform for `scale` under `config`.
    ///
    /// Designs the windows, places them and computes the dual frame. All
    /// of it is immutable afterwards.
    pub fn new(scale: &dyn Scale, config: NSGTConfig) -> Result<Self> {
        config.validate()?;

        // dropping edge bands only makes sense when the mirrored half is implied
        let reduced_form = if config.real { config.reduced_form } else { 0 };
        if !config.real && config.reduced_form > 0 {
            log::warn!(
                "Reduced form {} ignored for complex signals, keeping all bands",
                config.reduced_form
            );
        }

        let design = design_windows(&scale.bands(), config.fs, config.ls)?;

        let mut bin_counts = design.bin_counts;
        if config.matrix_form {
            let uniform = apply_matrix_form(&mut bin_counts, reduced_form)?;
            log::debug!("Matrix form: {} bins for every band", uniform);
        }

        let (placements, nn) = calc_window_ranges(&design.windows, &design.rfbas, config.ls);
        let dual_windows = compute_dual_windows(&design.windows, &placements, &bin_counts, nn)?;

        let frame = FrameSet {
            frequencies: design.frequencies,
            windows: design.windows,
            dual_windows,
            placements,
            bin_counts,
            nn,
            ls: config.ls,
        };

        let kept = frame.kept_bands(config.real, reduced_form);
        if kept.is_empty() {
            return Err(NSGTError::invalid(format!(
                "Reduced form {} leaves no band out of {}",
                reduced_form,
                frame.num_bands()
            )));
        }

        let sizes = frame
            .bin_counts
            .iter()
            .copied()
            .chain([nn, config.ls]);
        let ffts = Arc::new(FftBank::new(sizes, config.ls, config.measure_fft));
        let frame = Arc::new(frame);

        log::info!(
            "NSGT ready: {} bands ({} kept), Ls = {}, fs = {} Hz, bins {}..={}",
            frame.num_bands(),
            kept.len(),
            config.ls,
            config.fs,
            frame.bin_counts.iter().min().copied().unwrap_or(0),
            frame.bin_counts.iter().max().copied().unwrap_or(0)
        );

        let analyzer = NSGTAnalyzer::new(
            Arc::clone(&frame),
            Arc::clone(&ffts),
            kept.clone(),
            config.real,
            config.matrix_form,
        );
        let synthesizer = NSGTSynthesizer::new(Arc::clone(&frame), Arc::clone(&ffts), kept, config.real);

        Ok(Self {
            config,
            frame,
            ffts,
            analyzer,
            synthesizer,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &NSGTConfig {
        &self.config
    }

    /// Get the total number of bands, mirrored ones included
    pub fn num_bands(&self) -> usize {
        self.frame.num_bands()
    }

    /// Get the range of bands that carry coefficients
    pub fn kept_bands(&self) -> Range<usize> {
        self.analyzer.bands()
    }

    /// Get the scale frequencies inside `(0, fs/2)`
    pub fn frequencies(&self) -> &[f64] {
        &self.frame.frequencies
    }

    /// Get the per-band bin counts
    pub fn bin_counts(&self) -> &[usize] {
        &self.frame.bin_counts
    }

    pub fn windows(&self) -> &[Vec<f64>] {
        &self.frame.windows
    }

    pub fn dual_windows(&self) -> &[Vec<f64>] {
        &self.frame.dual_windows
    }

    pub fn placements(&self) -> &[Placement] {
        &self.frame.placements
    }

    /// Get the length of the circular spectrum
    pub fn nn(&self) -> usize {
        self.frame.nn
    }

    /// Center frequency in Hz of band `k`, mirrored bands reported negative
    pub fn band_frequency(&self, k: usize) -> f64 {
        let scale_bands = self.frame.scale_bands();
        match k {
            0 => 0.0,
            k if k <= scale_bands => self.frame.frequencies[k - 1],
            k if k == scale_bands + 1 => self.config.nyquist(),
            k => -self.frame.frequencies[self.num_bands() - k - 1],
        }
    }

    /// FFT timings collected so far (empty unless `measure_fft` is set)
    pub fn fft_timings(&self) -> Vec<FftTiming> {
        self.ffts.timings()
    }

    /// Forward transform of every channel
    pub fn forward<S: Sample>(&self, signal: &Channels<Vec<S>>) -> Result<Channels<Coefficients>> {
        self.check_layout(signal)?;
        let coefficients = map_channels(signal.as_slice(), |channel| {
            self.forward_channel(channel)
        })?;
        Channels::from_vec(signal.layout(), coefficients)
    }

    /// Backward transform of every channel
    pub fn backward<S: Sample>(
        &self,
        coefficients: &Channels<Coefficients>,
    ) -> Result<Channels<Vec<S>>> {
        self.check_layout(coefficients)?;
        let signals = map_channels(coefficients.as_slice(), |channel| {
            self.backward_channel(channel)
        })?;
        Channels::from_vec(coefficients.layout(), signals)
    }

    /// Forward transform of a single channel of `ls` samples
    pub fn forward_channel<S: Sample>(&self, signal: &[S]) -> Result<Coefficients> {
        log::debug!("Analyzing channel of {} samples", signal.len());
        self.analyzer.analyze(signal)
    }

    /// Backward transform of a single channel
    pub fn backward_channel<S: Sample>(&self, coefficients: &Coefficients) -> Result<Vec<S>> {
        log::debug!("Synthesizing channel from {} bands", coefficients.num_bands());
        self.synthesizer.synthesize(coefficients)
    }

    fn check_layout<T>(&self, channels: &Channels<T>) -> Result<()> {
        if channels.layout() != self.config.layout() {
            return Err(NSGTError::shape(format!(
                "Expected {:?} channel layout, got {:?}",
                self.config.layout(),
                channels.layout()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for NSGT {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NSGT")
            .field("config", &self.config)
            .field("num_bands", &self.num_bands())
            .field("kept_bands", &self.kept_bands())
            .field("nn", &self.nn())
            .finish()
    }
}

#[cfg(feature = "parallel")]
fn map_channels<T, U, F>(channels: &[T], f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U> + Sync + Send,
{
    use rayon::prelude::*;
    channels.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_channels<T, U, F>(channels: &[T], f: F) -> Result<Vec<U>>
where
    F: Fn(&T) -> Result<U>,
{
    channels.iter().map(f).collect()
}

/// Constant-Q NSGT on a geometric (octave) scale
#[derive(Debug)]
pub struct CQNSGT {
    nsgt: NSGT,
    scale: OctScale,
}

impl CQNSGT {
    /// Build a constant-Q transform with `bins` bands per octave in
    /// `[fmin, fmax]`.
    pub fn new(fmin: f64, fmax: f64, bins: usize, config: NSGTConfig) -> Result<Self> {
        config.validate()?;
        let scale = OctScale::new(fmin, fmax, bins)?;
        let nsgt = NSGT::new(&scale, config)?;
        Ok(Self { nsgt, scale })
    }

    /// Get the underlying scale
    pub fn scale(&self) -> &OctScale {
        &self.scale
    }

    pub fn into_inner(self) -> NSGT {
        self.nsgt
    }
}

impl Deref for CQNSGT {
    type Target = NSGT;

    fn deref(&self) -> &NSGT {
        &self.nsgt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    fn config(ls: usize) -> NSGTConfig {
        NSGTConfig::new(44100.0, ls).unwrap()
    }

    fn test_signal(ls: usize) -> Vec<f64> {
        (0..ls)
            .map(|i| {
                let t = i as f64 / ls as f64;
                (2.0 * PI * 37.0 * t).sin() + 0.5 * (2.0 * PI * 211.0 * t + 0.3).cos()
            })
            .collect()
    }

    fn max_error(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_processor_creation() {
        let nsgt = CQNSGT::new(50.0, 10000.0, 12, config(4096)).unwrap();
        let lbas = nsgt.frequencies().len();
        assert_eq!(nsgt.num_bands(), 2 * lbas + 2);
        assert_eq!(nsgt.kept_bands(), 0..lbas + 2);
        assert_eq!(nsgt.nn(), 4096);
        assert_eq!(nsgt.windows().len(), nsgt.dual_windows().len());
        assert_eq!(nsgt.placements().len(), nsgt.num_bands());
        assert!(nsgt.fft_timings().is_empty());
    }

    #[test]
    fn test_channel_roundtrip() {
        let ls = 3000;
        let nsgt = CQNSGT::new(80.0, 12000.0, 8, config(ls)).unwrap();
        let signal = test_signal(ls);

        let coefficients = nsgt.forward_channel(&signal).unwrap();
        assert_eq!(coefficients.num_bands(), nsgt.kept_bands().len());

        let reconstructed: Vec<f64> = nsgt.backward_channel(&coefficients).unwrap();
        assert_eq!(reconstructed.len(), ls);
        assert!(max_error(&signal, &reconstructed) < 1e-9);
    }

    #[test]
    fn test_complex_mode_keeps_all_bands() {
        let ls = 2048;
        let nsgt = CQNSGT::new(100.0, 8000.0, 6, config(ls).with_real(false)).unwrap();
        assert_eq!(nsgt.kept_bands(), 0..nsgt.num_bands());

        let signal: Vec<Complex64> = (0..ls)
            .map(|i| Complex64::from_polar(1.0, 0.01 * (i * i) as f64))
            .collect();
        let coefficients = nsgt.forward_channel(&signal).unwrap();
        let reconstructed: Vec<Complex64> = nsgt.backward_channel(&coefficients).unwrap();
        for (a, b) in signal.iter().zip(&reconstructed) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn test_layout_mismatch() {
        let nsgt = CQNSGT::new(50.0, 5000.0, 4, config(1000)).unwrap();
        let multi = Channels::Multi(vec![vec![0.0; 1000]]);
        assert!(matches!(
            nsgt.forward(&multi),
            Err(NSGTError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_wrong_signal_length() {
        let nsgt = CQNSGT::new(50.0, 5000.0, 4, config(1000)).unwrap();
        assert!(matches!(
            nsgt.forward_channel(&vec![0.0; 999]),
            Err(NSGTError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_wrong_coefficient_shape() {
        let nsgt = CQNSGT::new(50.0, 5000.0, 4, config(1000)).unwrap();
        let mut bands = nsgt.forward_channel(&vec![0.0; 1000]).unwrap().into_ragged();

        bands[1].pop();
        let result: Result<Vec<f64>> = nsgt.backward_channel(&Coefficients::Ragged(bands.clone()));
        assert!(matches!(result, Err(NSGTError::ShapeMismatch(_))));

        bands.pop();
        let result: Result<Vec<f64>> = nsgt.backward_channel(&Coefficients::Ragged(bands));
        assert!(matches!(result, Err(NSGTError::ShapeMismatch(_))));
    }

    #[test]
    fn test_complex_samples_rejected_in_real_mode() {
        let ls = 2000;
        let nsgt = CQNSGT::new(100.0, 8000.0, 6, config(ls)).unwrap();
        let chirp: Vec<Complex64> = (0..ls)
            .map(|i| Complex64::from_polar(1.0, 0.01 * (i * i) as f64))
            .collect();
        assert!(matches!(
            nsgt.forward_channel(&chirp),
            Err(NSGTError::InvalidParameter(_))
        ));

        let coefficients = nsgt.forward_channel(&test_signal(ls)).unwrap();
        let result: Result<Vec<Complex64>> = nsgt.backward_channel(&coefficients);
        assert!(matches!(result, Err(NSGTError::InvalidParameter(_))));

        let multi = CQNSGT::new(100.0, 8000.0, 6, config(ls).with_multichannel(true)).unwrap();
        assert!(multi.forward(&Channels::Multi(vec![chirp])).is_err());
    }

    #[test]
    fn test_band_frequency() {
        let nsgt = CQNSGT::new(100.0, 1000.0, 3, config(4410)).unwrap();
        let k = nsgt.num_bands();
        let lbas = nsgt.frequencies().len();
        assert_eq!(nsgt.band_frequency(0), 0.0);
        assert_eq!(nsgt.band_frequency(1), 100.0);
        assert_eq!(nsgt.band_frequency(lbas + 1), 22050.0);
        assert_eq!(nsgt.band_frequency(k - 1), -100.0);
    }

    #[test]
    fn test_measured_fft_timings() {
        let ls = 1024;
        let nsgt = CQNSGT::new(100.0, 5000.0, 4, config(ls).with_measure_fft(true)).unwrap();
        let coefficients = nsgt.forward_channel(&test_signal(ls)).unwrap();
        let _: Vec<f64> = nsgt.backward_channel(&coefficients).unwrap();

        let timings = nsgt.fft_timings();
        assert!(!timings.is_empty());
        assert!(timings.iter().any(|t| t.size == ls && t.calls >= 2));
    }
}
