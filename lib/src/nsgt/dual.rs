//! Canonical dual windows for painless non-stationary Gabor frames
//!
//! When every band has at least as many bins as its window is long, the
//! frame operator is diagonal in the spectral domain. Its diagonal is
//! `sum_k M[k] * |g_k|^2` over all windows covering a position, and the dual
//! window of band `k` is `g_k` divided by that diagonal on its own support.

use super::placement::{centered_index, Placement};
use crate::error::NSGTError;
use crate::Result;

/// Accumulate the frame-operator diagonal over a circle of length `nn`.
pub fn frame_diagonal(
    windows: &[Vec<f64>],
    placements: &[Placement],
    bin_counts: &[usize],
    nn: usize,
) -> Vec<f64> {
    let mut diagonal = vec![0.0; nn];

    for ((window, placement), &m) in windows.iter().zip(placements).zip(bin_counts) {
        let len = window.len();
        for (j, pos) in placement.positions(nn) {
            let w = window[centered_index(j, len, len)];
            diagonal[pos] += w * w * m as f64;
        }
    }

    diagonal
}

/// Compute the dual (synthesis) windows.
///
/// Fails with [`NSGTError::DegenerateFrame`] if the windows leave a
/// position of the circle uncovered, where no dual exists.
pub fn compute_dual_windows(
    windows: &[Vec<f64>],
    placements: &[Placement],
    bin_counts: &[usize],
    nn: usize,
) -> Result<Vec<Vec<f64>>> {
    let diagonal = frame_diagonal(windows, placements, bin_counts, nn);

    if let Some((position, &weight)) = diagonal
        .iter()
        .enumerate()
        .find(|(_, &d)| !(d > 0.0) || !d.is_finite())
    {
        log::error!(
            "Frame diagonal is {} at position {} of {}: windows do not cover the spectrum",
            weight,
            position,
            nn
        );
        return Err(NSGTError::DegenerateFrame { position, weight });
    }

    let duals = windows
        .iter()
        .zip(placements)
        .map(|(window, placement)| {
            let len = window.len();
            let mut dual = window.clone();
            for (j, pos) in placement.positions(nn) {
                dual[centered_index(j, len, len)] /= diagonal[pos];
            }
            dual
        })
        .collect();

    Ok(duals)
}
