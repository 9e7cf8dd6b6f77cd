//! Coefficient maps for visualization
//!
//! Every NSGT band holds its own time series at its own rate. A
//! [`CoefficientMap`] puts them on a common time grid so they can be
//! inspected or rendered like a spectrogram with one row per band.

use crate::error::NSGTError;
use crate::nsgt::Coefficients;
use crate::Result;

/// Band magnitudes resampled to a common width
#[derive(Debug, Clone)]
pub struct CoefficientMap {
    /// Magnitude data (band x column)
    pub magnitudes: Vec<Vec<f64>>,
    /// Number of bands (rows)
    pub num_bands: usize,
    /// Number of time columns
    pub width: usize,
    /// Center frequency of each row in Hz (if known)
    pub frequencies: Option<Vec<f64>>,
    /// Signal duration in seconds (if known)
    pub duration: Option<f64>,
}

impl CoefficientMap {
    /// Build a map from one channel's coefficients.
    ///
    /// Each column takes the peak magnitude of the band coefficients that
    /// fall into its time slice; bands with fewer coefficients than columns
    /// repeat their nearest value.
    pub fn from_coefficients(coefficients: &Coefficients, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(NSGTError::invalid("Map width must be at least 1"));
        }
        if coefficients.num_bands() == 0 {
            return Err(NSGTError::shape("No bands to map"));
        }

        let magnitudes: Vec<Vec<f64>> = coefficients
            .bands()
            .map(|band| {
                let m = band.len();
                (0..width)
                    .map(|x| {
                        let start = x * m / width;
                        let end = ((x + 1) * m / width).max(start + 1).min(m);
                        band[start.min(m.saturating_sub(1))..end]
                            .iter()
                            .map(|c| c.norm())
                            .fold(0.0, f64::max)
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            num_bands: magnitudes.len(),
            magnitudes,
            width,
            frequencies: None,
            duration: None,
        })
    }

    /// Attach the center frequency of every row
    pub fn with_frequencies(mut self, frequencies: Vec<f64>) -> Result<Self> {
        if frequencies.len() != self.num_bands {
            return Err(NSGTError::shape(format!(
                "Got {} frequencies for {} bands",
                frequencies.len(),
                self.num_bands
            )));
        }
        self.frequencies = Some(frequencies);
        Ok(self)
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Convert magnitude to decibels relative to `reference`
    pub fn to_db(&self, reference: f64) -> Vec<Vec<f64>> {
        let min_db = -120.0;

        self.magnitudes
            .iter()
            .map(|band| {
                band.iter()
                    .map(|&mag| {
                        if mag > 0.0 {
                            (20.0 * (mag / reference).log10()).max(min_db)
                        } else {
                            min_db
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Get time axis values in seconds (column index if the duration is unknown)
    pub fn time_axis(&self) -> Vec<f64> {
        match self.duration {
            Some(seconds) => (0..self.width)
                .map(|x| x as f64 * seconds / self.width as f64)
                .collect(),
            None => (0..self.width).map(|x| x as f64).collect(),
        }
    }

    /// Get frequency axis values in Hz (row index if unknown)
    pub fn frequency_axis(&self) -> Vec<f64> {
        match &self.frequencies {
            Some(frequencies) => frequencies.clone(),
            None => (0..self.num_bands).map(|k| k as f64).collect(),
        }
    }

    /// Largest magnitude in the map
    pub fn peak(&self) -> f64 {
        self.magnitudes
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Band with the highest total magnitude
    pub fn loudest_band(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .map(|band| band.iter().sum::<f64>())
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k)
    }
}

/// Render coefficient maps to images
#[cfg(feature = "image")]
pub mod image {
    use super::*;
    use ::image::{ImageBuffer, Rgb, RgbImage};
    use std::path::Path;

    /// Color map types for visualization
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ColorMap {
        Viridis,
        Inferno,
        Grayscale,
        Jet,
    }

    impl ColorMap {
        /// Parse a color map name (case-insensitive)
        pub fn from_name(name: &str) -> Option<Self> {
            match name.to_ascii_lowercase().as_str() {
                "viridis" => Some(ColorMap::Viridis),
                "inferno" => Some(ColorMap::Inferno),
                "gray" | "grayscale" => Some(ColorMap::Grayscale),
                "jet" => Some(ColorMap::Jet),
                _ => None,
            }
        }

        /// Map a value in `[0, 1]` to a color
        pub fn color(self, value: f64) -> Rgb<u8> {
            let v = value.clamp(0.0, 1.0);
            let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0) as u8;

            match self {
                ColorMap::Viridis => Rgb([
                    to_u8(v * v * v * 0.3 + v * 0.1),
                    to_u8(v.sqrt() * 0.8 + v * 0.2),
                    to_u8(v.powf(0.3) * 0.9 + v * 0.1),
                ]),
                ColorMap::Inferno => Rgb([
                    to_u8(v * v * v * 0.5 + v * v * 0.5),
                    to_u8(v * v * 0.8),
                    to_u8(v.powi(4)),
                ]),
                ColorMap::Grayscale => {
                    let gray = to_u8(v);
                    Rgb([gray, gray, gray])
                }
                // piecewise linear ramps of the classic Jet map
                ColorMap::Jet => {
                    let ramp = |center: f64| 1.5 - (4.0 * (v - center)).abs();
                    Rgb([to_u8(ramp(0.75)), to_u8(ramp(0.5)), to_u8(ramp(0.25))])
                }
            }
        }
    }

    /// Options for coefficient map rendering
    #[derive(Debug, Clone)]
    pub struct CoefficientImageOptions {
        /// Pixel height of every band row
        pub row_height: u32,
        pub colormap: ColorMap,
        /// Dynamic range in dB below the peak
        pub dynamic_range_db: f64,
    }

    impl Default for CoefficientImageOptions {
        fn default() -> Self {
            Self {
                row_height: 4,
                colormap: ColorMap::Viridis,
                dynamic_range_db: 80.0,
            }
        }
    }

    /// Render the map, lowest band at the bottom
    pub fn generate_coefficient_image(
        map: &CoefficientMap,
        options: &CoefficientImageOptions,
    ) -> RgbImage {
        let row_height = options.row_height.max(1);
        let height = map.num_bands as u32 * row_height;
        let mut img = ImageBuffer::new(map.width as u32, height);

        let peak = map.peak();
        if !(peak > 0.0) {
            return img;
        }
        let db = map.to_db(peak);
        let range = options.dynamic_range_db.max(f64::EPSILON);

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let band = map.num_bands - 1 - (y / row_height) as usize;
            let normalized = (db[band][x as usize] + range) / range;
            *pixel = options.colormap.color(normalized);
        }

        img
    }

    /// Save a coefficient map as an image file
    pub fn save_coefficient_map<P: AsRef<Path>>(
        map: &CoefficientMap,
        path: P,
        options: &CoefficientImageOptions,
    ) -> Result<()> {
        generate_coefficient_image(map, options)
            .save(path)
            .map_err(|e| NSGTError::Audio(format!("Failed to save coefficient image: {}", e)))
    }

}
