//! Forward transform: signal to band coefficients

use super::core::{CoefficientMatrix, Coefficients, FrameSet, Sample};
use super::fft::FftBank;
use super::placement::centered_index;
use crate::error::NSGTError;
use crate::Result;
use num_complex::Complex64;
use std::ops::Range;
use std::sync::Arc;

/// NSGT analyzer for the forward transform
pub struct NSGTAnalyzer {
    frame: Arc<FrameSet>,
    ffts: Arc<FftBank>,
    bands: Range<usize>,
    real: bool,
    matrix_form: bool,
}

impl NSGTAnalyzer {
    /// Create an analyzer producing coefficients for `bands`
    pub fn new(
        frame: Arc<FrameSet>,
        ffts: Arc<FftBank>,
        bands: Range<usize>,
        real: bool,
        matrix_form: bool,
    ) -> Self {
        Self {
            frame,
            ffts,
            bands,
            real,
            matrix_form,
        }
    }

    /// Bands that receive coefficients
    pub fn bands(&self) -> Range<usize> {
        self.bands.clone()
    }

    /// Transform one channel of `ls` samples.
    ///
    /// A real-mode analyzer only accepts real samples, since it keeps the
    /// non-negative frequencies alone.
    pub fn analyze<S: Sample>(&self, signal: &[S]) -> Result<Coefficients> {
        if self.real && !S::REAL {
            return Err(NSGTError::invalid(
                "Complex samples need a transform built with real = false",
            ));
        }

        let frame = &*self.frame;
        if signal.len() != frame.ls {
            return Err(NSGTError::shape(format!(
                "Signal has {} samples, transform is configured for {}",
                signal.len(),
                frame.ls
            )));
        }

        let mut spectrum = S::spectrum(signal, &self.ffts)?;
        if frame.nn > spectrum.len() {
            spectrum.resize(frame.nn, Complex64::new(0.0, 0.0));
        }

        let mut bands = Vec::with_capacity(self.bands.len());
        for k in self.bands.clone() {
            bands.push(self.analyze_band(&spectrum, k)?);
        }

        if self.matrix_form {
            CoefficientMatrix::from_rows(bands).map(Coefficients::Matrix)
        } else {
            Ok(Coefficients::Ragged(bands))
        }
    }

    /// Window the spectrum around band `k` and bring it back to the time
    /// domain at the band's own rate.
    fn analyze_band(&self, spectrum: &[Complex64], k: usize) -> Result<Vec<Complex64>> {
        let frame = &*self.frame;
        let window = &frame.windows[k];
        let placement = &frame.placements[k];
        let m = frame.bin_counts[k];
        let len = window.len();
        debug_assert!(m >= len, "band {} has {} bins for a window of {}", k, m, len);

        let mut band = vec![Complex64::new(0.0, 0.0); m];
        for (j, pos) in placement.positions(frame.nn) {
            band[centered_index(j, len, m)] = spectrum[pos] * window[centered_index(j, len, len)];
        }

        self.ffts.inverse(&mut band)?;
        let scale = 1.0 / m as f64;
        for c in band.iter_mut() {
            *c *= scale;
        }

        log::trace!("Band {}: {} coefficients from window of {}", k, m, len);
        Ok(band)
    }
}
