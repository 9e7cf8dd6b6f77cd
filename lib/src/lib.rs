//! NSGT Library
//!
//! An invertible non-stationary Gabor transform (NSGT) with a constant-Q
//! variant. Signals of a fixed length are analyzed with frequency-adaptive
//! windows and reconstructed exactly from the resulting coefficients.

pub mod audio_io;
pub mod error;
pub mod nsgt;
pub mod processor;
pub mod scale;
pub mod spectrogram;
pub mod utils;
pub mod window;

pub use error::NSGTError;
pub use nsgt::{Channels, CoefficientMatrix, Coefficients, NSGTConfig};
pub use num_complex::Complex64;
pub use processor::{CQNSGT, NSGT};
pub use rustfft; // Re-export rustfft for external use if needed
pub use scale::{OctScale, Scale, ScaleBand};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
///
/// Sets up logging when the `env_logger` feature is enabled. Safe to call
/// more than once.
pub fn init() {
    #[cfg(feature = "env_logger")]
    {
        let _ = env_logger::try_init();
    }
}

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, NSGTError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        init();
        init();
        assert!(!VERSION.is_empty());
    }
}
