//! Error types for transform construction and application

use thiserror::Error;

/// Errors raised while building or applying a non-stationary Gabor transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NSGTError {
    /// A scalar construction argument is out of range.
    ///
    /// Raised before any window or dual-frame computation takes place.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The window design leaves a gap in the frame: the accumulated
    /// frame-operator diagonal is zero or non-finite at `position`.
    #[error("Degenerate frame: diagonal weight {weight} at spectral position {position}")]
    DegenerateFrame { position: usize, weight: f64 },

    /// Signal or coefficient shapes do not match the configured transform.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Audio decoding or encoding failed.
    #[error("Audio I/O error: {0}")]
    Audio(String),
}

impl NSGTError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        NSGTError::InvalidParameter(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        NSGTError::ShapeMismatch(msg.into())
    }
}
