//! Inverse transform: band coefficients back to a signal

use super::core::{Coefficients, FrameSet, Sample};
use super::fft::FftBank;
use super::placement::centered_index;
use crate::error::NSGTError;
use crate::Result;
use num_complex::Complex64;
use std::ops::Range;
use std::sync::Arc;

/// NSGT synthesizer for the inverse transform
pub struct NSGTSynthesizer {
    frame: Arc<FrameSet>,
    ffts: Arc<FftBank>,
    bands: Range<usize>,
    real: bool,
}

impl NSGTSynthesizer {
    pub fn new(frame: Arc<FrameSet>, ffts: Arc<FftBank>, bands: Range<usize>, real: bool) -> Self {
        Self {
            frame,
            ffts,
            bands,
            real,
        }
    }

    /// Reconstruct `ls` samples from the coefficients of one channel.
    ///
    /// In real mode the negative-frequency bands are not stored; each kept
    /// scale band also adds its conjugate-symmetric mirror.
    pub fn synthesize<S: Sample>(&self, coefficients: &Coefficients) -> Result<Vec<S>> {
        if self.real && !S::REAL {
            return Err(NSGTError::invalid(
                "Real-mode synthesis produces real samples, not complex ones",
            ));
        }
        self.check_shape(coefficients)?;

        let frame = &*self.frame;
        let mut spectrum = vec![Complex64::new(0.0, 0.0); frame.nn];

        for (band, k) in coefficients.bands().zip(self.bands.clone()) {
            let mut t = band.to_vec();
            self.ffts.forward(&mut t)?;
            self.accumulate(&mut spectrum, k, &t);

            if self.real {
                if let Some(mirror) = frame.mirror(k) {
                    let m = t.len();
                    let mirrored: Vec<Complex64> = (0..m).map(|s| t[(m - s) % m].conj()).collect();
                    self.accumulate(&mut spectrum, mirror, &mirrored);
                }
            }
        }

        self.ffts.inverse(&mut spectrum)?;
        let scale = 1.0 / frame.nn as f64;

        Ok(spectrum
            .into_iter()
            .take(frame.ls)
            .map(|x| S::from_complex(x * scale))
            .collect())
    }

    /// Add one band's dual-windowed spectrum into the circular buffer
    fn accumulate(&self, spectrum: &mut [Complex64], k: usize, t: &[Complex64]) {
        let frame = &*self.frame;
        let dual = &frame.dual_windows[k];
        let len = dual.len();
        let m = t.len();
        let weight = frame.bin_counts[k] as f64;

        for (j, pos) in frame.placements[k].positions(frame.nn) {
            spectrum[pos] += t[centered_index(j, len, m)] * (dual[centered_index(j, len, len)] * weight);
        }
    }

    fn check_shape(&self, coefficients: &Coefficients) -> Result<()> {
        let expected = self.bands.len();
        if coefficients.num_bands() != expected {
            return Err(NSGTError::shape(format!(
                "Coefficients have {} bands, transform produces {}",
                coefficients.num_bands(),
                expected
            )));
        }

        for (i, (band, k)) in coefficients.bands().zip(self.bands.clone()).enumerate() {
            let m = self.frame.bin_counts[k];
            if band.len() != m {
                return Err(NSGTError::shape(format!(
                    "Band {} has {} coefficients, expected {}",
                    i,
                    band.len(),
                    m
                )));
            }
        }

        Ok(())
    }
}
