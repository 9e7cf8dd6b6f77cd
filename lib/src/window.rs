//! Window functions for the band filters
//!
//! Band windows live in the frequency domain and are stored zero-centred:
//! index 0 holds the peak, the second half of the buffer holds the
//! negative offsets. This is the layout the placement arithmetic expects.

use std::f64::consts::PI;

/// Generate a zero-centred periodic Hann window of `size` samples.
///
/// `w[i] = 0.5 * (1 + cos(2 pi i / size))`, so `w[0] = 1` and, for even
/// sizes, `w[size / 2] = 0`.
pub fn hann(size: usize) -> Vec<f64> {
    let mut window = vec![0.0; size];
    generate_hann(&mut window);
    window
}

fn generate_hann(window: &mut [f64]) {
    let n = window.len() as f64;
    for (i, w) in window.iter_mut().enumerate() {
        *w = 0.5 * (1.0 + (2.0 * PI * i as f64 / n).cos());
    }
}

/// Calculate the coherent gain of a window (sum of window values)
pub fn coherent_gain(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Calculate the power gain of a window (sum of squared window values)
pub fn power_gain(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
