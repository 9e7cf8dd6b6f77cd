//! Planned FFTs for every transform size a configuration needs
//!
//! All plans are created up front so the forward and backward passes only
//! read shared state. Optional timing keeps a running total per size.

use crate::error::NSGTError;
use crate::Result;
use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Accumulated timing of one FFT size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftTiming {
    /// Transform length
    pub size: usize,
    /// Number of transforms run
    pub calls: usize,
    /// Total time spent
    pub total: Duration,
}

impl FftTiming {
    /// Mean time per call
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// FFT plans keyed by size
pub struct FftBank {
    forward: BTreeMap<usize, Arc<dyn Fft<f64>>>,
    inverse: BTreeMap<usize, Arc<dyn Fft<f64>>>,
    real_forward: BTreeMap<usize, Arc<dyn RealToComplex<f64>>>,
    timings: Option<Mutex<BTreeMap<usize, FftTiming>>>,
}

impl FftBank {
    /// Plan complex forward and inverse transforms for every size in
    /// `sizes`, and a real-input transform for `real_size`.
    pub fn new(sizes: impl IntoIterator<Item = usize>, real_size: usize, measure: bool) -> Self {
        let sizes: BTreeSet<usize> = sizes.into_iter().collect();

        let mut planner = FftPlanner::<f64>::new();
        let mut forward = BTreeMap::new();
        let mut inverse = BTreeMap::new();
        for &size in &sizes {
            forward.insert(size, planner.plan_fft_forward(size));
            inverse.insert(size, planner.plan_fft_inverse(size));
        }

        let mut real_planner = RealFftPlanner::<f64>::new();
        let mut real_forward = BTreeMap::new();
        real_forward.insert(real_size, real_planner.plan_fft_forward(real_size));

        log::debug!(
            "Planned {} complex FFT sizes and real FFT size {}",
            sizes.len(),
            real_size
        );

        Self {
            forward,
            inverse,
            real_forward,
            timings: measure.then(|| Mutex::new(BTreeMap::new())),
        }
    }

    /// In-place unnormalized forward transform
    pub fn forward(&self, buffer: &mut [Complex64]) -> Result<()> {
        let fft = Self::plan(&self.forward, buffer.len())?;
        self.timed(buffer.len(), || fft.process(buffer));
        Ok(())
    }

    /// In-place unnormalized inverse transform
    pub fn inverse(&self, buffer: &mut [Complex64]) -> Result<()> {
        let fft = Self::plan(&self.inverse, buffer.len())?;
        self.timed(buffer.len(), || fft.process(buffer));
        Ok(())
    }

    /// Full-length spectrum of a real signal.
    ///
    /// The real-input transform yields the non-negative half; the rest is
    /// filled in by conjugate symmetry.
    pub fn real_spectrum(&self, signal: &[f64]) -> Result<Vec<Complex64>> {
        let n = signal.len();
        let r2c = self.real_forward.get(&n).ok_or_else(|| {
            NSGTError::shape(format!("No real FFT planned for length {}", n))
        })?;

        let mut input = signal.to_vec();
        let mut half = r2c.make_output_vec();
        self.timed(n, || r2c.process(&mut input, &mut half))
            .map_err(|e| NSGTError::shape(format!("FFT error: {}", e)))?;

        let mut spectrum = vec![Complex64::new(0.0, 0.0); n];
        spectrum[..half.len()].copy_from_slice(&half);
        for i in half.len()..n {
            spectrum[i] = spectrum[n - i].conj();
        }
        Ok(spectrum)
    }

    /// Timings recorded so far, sorted by size (empty unless measuring)
    pub fn timings(&self) -> Vec<FftTiming> {
        self.timings
            .as_ref()
            .and_then(|t| t.lock().ok().map(|t| t.values().copied().collect()))
            .unwrap_or_default()
    }

    pub fn is_measuring(&self) -> bool {
        self.timings.is_some()
    }

    fn plan<P: ?Sized>(plans: &BTreeMap<usize, Arc<P>>, size: usize) -> Result<&Arc<P>> {
        plans
            .get(&size)
            .ok_or_else(|| NSGTError::shape(format!("No FFT planned for length {}", size)))
    }

    fn timed<T>(&self, size: usize, run: impl FnOnce() -> T) -> T {
        let Some(timings) = &self.timings else {
            return run();
        };

        let started = Instant::now();
        let out = run();
        let elapsed = started.elapsed();

        if let Ok(mut timings) = timings.lock() {
            let entry = timings.entry(size).or_insert(FftTiming {
                size,
                calls: 0,
                total: Duration::ZERO,
            });
            entry.calls += 1;
            entry.total += elapsed;
        }
        out
    }
}

impl std::fmt::Debug for FftBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftBank")
            .field("sizes", &self.forward.keys().collect::<Vec<_>>())
            .field("real_sizes", &self.real_forward.keys().collect::<Vec<_>>())
            .field("measuring", &self.is_measuring())
            .finish()
    }
}
