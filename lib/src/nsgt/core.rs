//! Core types and structures for the non-stationary Gabor transform

use super::fft::FftBank;
use super::placement::Placement;
use crate::error::NSGTError;
use crate::Result;
use num_complex::Complex64;
use std::ops::Range;

/// Largest number of edge bands that may be dropped per half-spectrum
pub const MAX_REDUCED_FORM: usize = 2;

/// Transform configuration (fixed once the transform is built)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NSGTConfig {
    /// Sample rate in Hz
    pub fs: f64,
    /// Signal length in samples
    pub ls: usize,
    /// Keep only non-negative frequency bands (real-valued signals)
    pub real: bool,
    /// Force one bin count for every band and return a coefficient matrix
    pub matrix_form: bool,
    /// Number of edge bands to drop per half-spectrum (0, 1 or 2)
    pub reduced_form: usize,
    /// Treat inputs as a list of channels instead of a single signal
    pub multichannel: bool,
    /// Record per-size FFT timings
    pub measure_fft: bool,
}

impl Default for NSGTConfig {
    fn default() -> Self {
        Self {
            fs: 44100.0,
            ls: 44100,
            real: true,
            matrix_form: false,
            reduced_form: 0,
            multichannel: false,
            measure_fft: false,
        }
    }
}

impl NSGTConfig {
    /// Create a validated configuration for sample rate `fs` and length `ls`
    pub fn new(fs: f64, ls: usize) -> Result<Self> {
        let config = Self {
            fs,
            ls,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_real(mut self, real: bool) -> Self {
        self.real = real;
        self
    }

    pub fn with_matrix_form(mut self, matrix_form: bool) -> Self {
        self.matrix_form = matrix_form;
        self
    }

    pub fn with_reduced_form(mut self, reduced_form: usize) -> Self {
        self.reduced_form = reduced_form;
        self
    }

    pub fn with_multichannel(mut self, multichannel: bool) -> Self {
        self.multichannel = multichannel;
        self
    }

    pub fn with_measure_fft(mut self, measure_fft: bool) -> Self {
        self.measure_fft = measure_fft;
        self
    }

    /// Check the scalar parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.fs > 0.0) || !self.fs.is_finite() {
            return Err(NSGTError::invalid(format!(
                "Sample rate must be positive and finite, got {}",
                self.fs
            )));
        }

        if self.ls == 0 {
            return Err(NSGTError::invalid("Signal length must be at least 1"));
        }

        if self.reduced_form > MAX_REDUCED_FORM {
            return Err(NSGTError::invalid(format!(
                "Reduced form must be between 0 and {}, got {}",
                MAX_REDUCED_FORM, self.reduced_form
            )));
        }

        Ok(())
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        self.fs / 2.0
    }

    /// Channel layout implied by the `multichannel` flag
    pub fn layout(&self) -> ChannelLayout {
        if self.multichannel {
            ChannelLayout::Multi
        } else {
            ChannelLayout::Single
        }
    }
}

/// How inputs and outputs are grouped into channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Single,
    Multi,
}

/// A single channel or an ordered list of channels
#[derive(Debug, Clone, PartialEq)]
pub enum Channels<T> {
    Single(T),
    Multi(Vec<T>),
}

impl<T> Channels<T> {
    pub fn layout(&self) -> ChannelLayout {
        match self {
            Channels::Single(_) => ChannelLayout::Single,
            Channels::Multi(_) => ChannelLayout::Multi,
        }
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// View the channels as a slice (one element for `Single`)
    pub fn as_slice(&self) -> &[T] {
        match self {
            Channels::Single(channel) => std::slice::from_ref(channel),
            Channels::Multi(channels) => channels,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Channels::Single(channel) => vec![channel],
            Channels::Multi(channels) => channels,
        }
    }

    /// Rebuild channels with the given layout
    pub fn from_vec(layout: ChannelLayout, mut channels: Vec<T>) -> Result<Self> {
        match layout {
            ChannelLayout::Multi => Ok(Channels::Multi(channels)),
            ChannelLayout::Single => {
                if channels.len() != 1 {
                    return Err(NSGTError::shape(format!(
                        "Single-channel layout needs exactly 1 channel, got {}",
                        channels.len()
                    )));
                }
                channels
                    .pop()
                    .map(Channels::Single)
                    .ok_or_else(|| NSGTError::shape("No channel data"))
            }
        }
    }

    /// The single channel, if this is a single-channel value
    pub fn into_single(self) -> Option<T> {
        match self {
            Channels::Single(channel) => Some(channel),
            Channels::Multi(_) => None,
        }
    }
}

/// Rectangular coefficient layout: one row per band, same bin count for all
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl CoefficientMatrix {
    /// Build a matrix from equally long rows
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(NSGTError::shape(format!(
                "Row {} has {} bins, expected {}",
                i,
                row.len(),
                cols
            )));
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, index: usize) -> &[Complex64] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.cols + col]
    }

    /// Row-major coefficient data
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }
}

/// Transform coefficients of one channel
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficients {
    /// One array per band, lengths follow the per-band bin counts
    Ragged(Vec<Vec<Complex64>>),
    /// Bands x uniform bin count
    Matrix(CoefficientMatrix),
}

impl Coefficients {
    pub fn num_bands(&self) -> usize {
        match self {
            Coefficients::Ragged(bands) => bands.len(),
            Coefficients::Matrix(matrix) => matrix.rows(),
        }
    }

    /// Coefficients of one band
    pub fn band(&self, index: usize) -> &[Complex64] {
        match self {
            Coefficients::Ragged(bands) => &bands[index],
            Coefficients::Matrix(matrix) => matrix.row(index),
        }
    }

    pub fn bands(&self) -> impl Iterator<Item = &[Complex64]> + '_ {
        (0..self.num_bands()).map(move |k| self.band(k))
    }

    /// Per-band coefficient counts
    pub fn band_lengths(&self) -> Vec<usize> {
        self.bands().map(<[Complex64]>::len).collect()
    }

    /// Convert to the ragged layout
    pub fn into_ragged(self) -> Vec<Vec<Complex64>> {
        match self {
            Coefficients::Ragged(bands) => bands,
            Coefficients::Matrix(matrix) => (0..matrix.rows())
                .map(|k| matrix.row(k).to_vec())
                .collect(),
        }
    }

    /// Total energy of the coefficients
    pub fn energy(&self) -> f64 {
        self.bands()
            .flat_map(|band| band.iter())
            .map(|c| c.norm_sqr())
            .sum()
    }
}

/// Sample types a transform can consume and produce
pub trait Sample: Copy + Send + Sync + 'static {
    /// Whether the type holds real values only
    const REAL: bool;

    fn to_complex(self) -> Complex64;

    /// Convert a reconstructed sample back, discarding what the type cannot hold
    fn from_complex(value: Complex64) -> Self;

    /// Full-length DFT of a signal
    fn spectrum(signal: &[Self], ffts: &FftBank) -> Result<Vec<Complex64>> {
        let mut buffer: Vec<Complex64> = signal.iter().map(|s| s.to_complex()).collect();
        ffts.forward(&mut buffer)?;
        Ok(buffer)
    }
}

impl Sample for f64 {
    const REAL: bool = true;

    fn to_complex(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    fn from_complex(value: Complex64) -> Self {
        value.re
    }

    fn spectrum(signal: &[Self], ffts: &FftBank) -> Result<Vec<Complex64>> {
        ffts.real_spectrum(signal)
    }
}

impl Sample for Complex64 {
    const REAL: bool = false;

    fn to_complex(self) -> Complex64 {
        self
    }

    fn from_complex(value: Complex64) -> Self {
        value
    }
}

/// Precomputed windows, duals and placements shared by analysis and synthesis
#[derive(Debug, Clone)]
pub struct FrameSet {
    /// Scale center frequencies that survived the design (Hz)
    pub frequencies: Vec<f64>,
    /// Analysis windows, zero-centred, one per band
    pub windows: Vec<Vec<f64>>,
    /// Synthesis windows, same lengths as `windows`
    pub dual_windows: Vec<Vec<f64>>,
    /// Circular spectral placement of every band
    pub placements: Vec<Placement>,
    /// Bins per band
    pub bin_counts: Vec<usize>,
    /// Length of the circular spectrum the bands are placed on
    pub nn: usize,
    /// Signal length
    pub ls: usize,
}

impl FrameSet {
    /// Number of bands including the mirrored negative-frequency ones
    pub fn num_bands(&self) -> usize {
        self.windows.len()
    }

    /// Number of scale bands (excluding DC, Nyquist and mirrors)
    pub fn scale_bands(&self) -> usize {
        self.frequencies.len()
    }

    /// Bands that carry coefficients for the given mode
    pub fn kept_bands(&self, real: bool, reduced_form: usize) -> Range<usize> {
        if real {
            reduced_form..self.num_bands() / 2 + 1 - reduced_form
        } else {
            0..self.num_bands()
        }
    }

    /// Negative-frequency partner of a positive scale band
    pub fn mirror(&self, band: usize) -> Option<usize> {
        let half = self.scale_bands();
        (1..=half).contains(&band).then(|| self.num_bands() - band)
    }
}
