//! Non-stationary Gabor transform building blocks
//!
//! The transform is set up once per configuration: windows are designed on
//! the frequency axis, placed on the circular spectrum, and inverted into
//! dual windows. Analysis and synthesis then share that frame read-only.

pub mod analyzer;
pub mod core;
pub mod design;
pub mod dual;
pub mod fft;
pub mod placement;
pub mod synthesizer;

// Re-export main types for convenience
pub use analyzer::NSGTAnalyzer;
pub use core::{
    ChannelLayout, Channels, CoefficientMatrix, Coefficients, FrameSet, NSGTConfig, Sample,
    MAX_REDUCED_FORM,
};
pub use fft::{FftBank, FftTiming};
pub use placement::Placement;
pub use synthesizer::NSGTSynthesizer;
