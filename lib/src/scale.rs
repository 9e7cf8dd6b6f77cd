//! Frequency scales feeding the window design
//!
//! A scale maps band indices to center frequencies and quality factors.
//! The transform only needs the ordered `(frequency, Q)` list, so any type
//! implementing [`Scale`] can drive it.

use crate::error::NSGTError;
use crate::Result;

/// Step used for the numerical Q estimate
const DBND: f64 = 1e-8;

/// One band of a frequency scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBand {
    /// Center frequency in Hz
    pub frequency: f64,
    /// Quality factor (center frequency / bandwidth)
    pub q: f64,
}

/// Provider of band center frequencies and quality factors
pub trait Scale {
    /// Number of bands
    fn len(&self) -> usize;

    /// Center frequency of a (possibly fractional) band index
    fn frequency(&self, band: f64) -> f64;

    /// Quality factor of a band.
    ///
    /// Defaults to a central-difference estimate from [`Scale::frequency`].
    fn q(&self, band: f64) -> f64 {
        self.frequency(band) * DBND
            / (self.frequency(band + DBND) - self.frequency(band - DBND))
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate all bands in order
    fn bands(&self) -> Vec<ScaleBand> {
        (0..self.len())
            .map(|b| ScaleBand {
                frequency: self.frequency(b as f64),
                q: self.q(b as f64),
            })
            .collect()
    }
}

/// Octave-spaced (constant-Q) scale between `fmin` and `fmax`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctScale {
    fmin: f64,
    fmax: f64,
    bands: usize,
    pow2n: f64,
    q: f64,
}

impl OctScale {
    /// Create a scale with `bins_per_octave` bands per octave.
    ///
    /// Both ends are included, so the band count is
    /// `ceil(log2(fmax / fmin) * bins_per_octave) + 1`.
    pub fn new(fmin: f64, fmax: f64, bins_per_octave: usize) -> Result<Self> {
        if !(fmin > 0.0) || !fmin.is_finite() {
            return Err(NSGTError::invalid(format!(
                "fmin must be positive, got {}",
                fmin
            )));
        }
        if !(fmax > fmin) || !fmax.is_finite() {
            return Err(NSGTError::invalid(format!(
                "fmax must exceed fmin ({}), got {}",
                fmin, fmax
            )));
        }
        if bins_per_octave == 0 {
            return Err(NSGTError::invalid("bins per octave must be at least 1"));
        }

        let lfmin = fmin.log2();
        let lfmax = fmax.log2();
        let bands = ((lfmax - lfmin) * bins_per_octave as f64).ceil() as usize + 1;
        let odiv = (lfmax - lfmin) / (bands - 1) as f64;
        let pow2n = 2f64.powf(odiv);
        let q = pow2n.sqrt() / (pow2n - 1.0) / 2.0;

        Ok(Self {
            fmin,
            fmax,
            bands,
            pow2n,
            q,
        })
    }

    pub fn fmin(&self) -> f64 {
        self.fmin
    }

    pub fn fmax(&self) -> f64 {
        self.fmax
    }

    /// Frequency ratio between neighbouring bands
    pub fn ratio(&self) -> f64 {
        self.pow2n
    }
}

impl Scale for OctScale {
    fn len(&self) -> usize {
        self.bands
    }

    fn frequency(&self, band: f64) -> f64 {
        self.fmin * self.pow2n.powf(band)
    }

    fn q(&self, _band: f64) -> f64 {
        self.q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oct_scale_endpoints() {
        let scale = OctScale::new(50.0, 700.0, 12).unwrap();
        // log2(14) * 12 = 45.7, both ends included
        assert_eq!(scale.len(), 47);

        let bands = scale.bands();
        assert!((bands[0].frequency - 50.0).abs() < 1e-9);
        assert!((bands.last().unwrap().frequency - 700.0).abs() < 1e-6);
        assert!(bands.windows(2).all(|w| w[1].frequency > w[0].frequency));
    }

    #[test]
    fn test_oct_scale_constant_q() {
        let scale = OctScale::new(100.0, 10000.0, 24).unwrap();
        let q0 = scale.q(0.0);
        assert!(q0 > 0.0);
        for band in scale.bands() {
            assert_eq!(band.q, q0);
        }
    }

    #[test]
    fn test_numerical_q_estimate() {
        struct Geometric;
        impl Scale for Geometric {
            fn len(&self) -> usize {
                4
            }
            fn frequency(&self, band: f64) -> f64 {
                100.0 * 2f64.powf(band)
            }
        }

        // F / (2 F') for F = a 2^b is 1 / (2 ln 2)
        let expected = 1.0 / (2.0 * std::f64::consts::LN_2);
        for band in Geometric.bands() {
            assert!((band.q - expected).abs() < 1e-4, "q = {}", band.q);
        }
    }

    #[test]
    fn test_oct_scale_validation() {
        assert!(OctScale::new(0.0, 100.0, 12).is_err());
        assert!(OctScale::new(100.0, 50.0, 12).is_err());
        assert!(OctScale::new(100.0, 100.0, 12).is_err());
        assert!(OctScale::new(50.0, 100.0, 0).is_err());
        assert!(OctScale::new(f64::NAN, 100.0, 12).is_err());
    }

    #[test]
    fn test_single_bin_per_octave() {
        let scale = OctScale::new(30.0, 17000.0, 1).unwrap();
        assert!(scale.len() >= 2);
        assert!(scale.ratio() <= 2.0 + 1e-12);
    }
}
