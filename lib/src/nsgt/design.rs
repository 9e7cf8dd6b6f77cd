//! Band window design from a frequency scale
//!
//! Windows are designed on the frequency axis of the full-length DFT. Band
//! `k` gets a Hann window spanning the distance between its two neighbours,
//! so the supports overlap and cover the whole circle from DC over Nyquist
//! back to DC. Bands are laid out as
//!
//! `[DC, f_1 .. f_L, Nyquist, fs - f_L .. fs - f_1]`
//!
//! giving `K = 2L + 2` bands, where the last `L` mirror the scale bands.

use crate::error::NSGTError;
use crate::scale::ScaleBand;
use crate::window::hann;
use crate::Result;

/// Smallest window (and bin count) any band may get
pub const MIN_WINDOW: usize = 4;

/// Output of the window design
#[derive(Debug, Clone)]
pub struct WindowDesign {
    /// Scale frequencies strictly inside `(0, fs/2)` (Hz)
    pub frequencies: Vec<f64>,
    /// Zero-centred analysis windows, one per band
    pub windows: Vec<Vec<f64>>,
    /// Rounded band centers in DFT bins
    pub rfbas: Vec<usize>,
    /// Bins per band
    pub bin_counts: Vec<usize>,
}

/// Design the band windows for a signal of `ls` samples at rate `fs`.
pub fn design_windows(bands: &[ScaleBand], fs: f64, ls: usize) -> Result<WindowDesign> {
    let nyquist = fs / 2.0;

    let kept: Vec<ScaleBand> = bands
        .iter()
        .copied()
        .filter(|b| b.frequency > 0.0 && b.frequency < nyquist)
        .collect();

    if kept.is_empty() {
        return Err(NSGTError::invalid(format!(
            "No scale frequency lies inside (0, {}) Hz",
            nyquist
        )));
    }
    if kept.len() < bands.len() {
        log::debug!(
            "Dropped {} scale bands outside (0, {}) Hz",
            bands.len() - kept.len(),
            nyquist
        );
    }

    if let Some(pair) = kept.windows(2).find(|w| !(w[1].frequency > w[0].frequency)) {
        return Err(NSGTError::invalid(format!(
            "Scale frequencies must be strictly increasing ({} Hz followed by {} Hz)",
            pair[0].frequency, pair[1].frequency
        )));
    }
    if let Some(band) = kept.iter().find(|b| !(b.q > 0.0) || !b.q.is_finite()) {
        return Err(NSGTError::invalid(format!(
            "Quality factor must be positive, got {} at {} Hz",
            band.q, band.frequency
        )));
    }

    let too_sharp: Vec<String> = kept
        .iter()
        .filter(|b| b.q >= b.frequency * ls as f64 / (8.0 * fs))
        .map(|b| format!("{:.2}", b.frequency))
        .collect();
    if !too_sharp.is_empty() {
        log::warn!(
            "Q-factor too high for frequencies {} at signal length {}",
            too_sharp.join(","),
            ls
        );
    }

    let lbas = kept.len();
    let num_bands = 2 * lbas + 2;
    let to_bins = ls as f64 / fs;

    let mut fbas = vec![0.0; num_bands];
    for (k, band) in kept.iter().enumerate() {
        fbas[k + 1] = band.frequency * to_bins;
        fbas[num_bands - k - 1] = (fs - band.frequency) * to_bins;
    }
    fbas[lbas + 1] = nyquist * to_bins;

    // each band spans the distance between its neighbours
    let mut bin_counts = vec![0usize; num_bands];
    bin_counts[0] = (2.0 * fbas[1]).round() as usize;
    for k in 1..=lbas + 1 {
        bin_counts[k] = (fbas[k + 1] - fbas[k - 1]).round() as usize;
    }
    for k in 1..=lbas {
        bin_counts[num_bands - k] = bin_counts[k];
    }
    for m in bin_counts.iter_mut() {
        *m = (*m).max(MIN_WINDOW);
        *m += *m % 2;
    }

    let windows: Vec<Vec<f64>> = bin_counts.iter().map(|&m| hann(m)).collect();

    // the highest scale band moves halfway to Nyquist to close the gap there
    fbas[lbas] = (fbas[lbas - 1] + fbas[lbas + 1]) / 2.0;

    let mut rfbas = vec![0usize; num_bands];
    for k in 0..=lbas + 1 {
        rfbas[k] = fbas[k].round() as usize;
    }
    for k in 1..=lbas {
        rfbas[num_bands - k] = ls - rfbas[k];
    }

    log::debug!(
        "Designed {} band windows ({} scale bands), lengths {}..={}",
        num_bands,
        lbas,
        bin_counts.iter().min().copied().unwrap_or(0),
        bin_counts.iter().max().copied().unwrap_or(0)
    );

    Ok(WindowDesign {
        frequencies: kept.iter().map(|b| b.frequency).collect(),
        windows,
        rfbas,
        bin_counts,
    })
}

/// Force one bin count on every band.
///
/// The common value is the largest bin count among the positive-frequency
/// bands that remain after dropping `reduced_form` bands at each edge.
pub fn apply_matrix_form(bin_counts: &mut [usize], reduced_form: usize) -> Result<usize> {
    let half = bin_counts.len() / 2 + 1;
    let retained = if reduced_form > 0 {
        bin_counts.get(reduced_form..half.saturating_sub(reduced_form))
    } else {
        Some(&bin_counts[..])
    };

    let max = retained
        .and_then(|m| m.iter().max().copied())
        .ok_or_else(|| {
            NSGTError::invalid(format!(
                "Reduced form {} leaves no band out of {}",
                reduced_form,
                bin_counts.len()
            ))
        })?;

    bin_counts.fill(max);
    Ok(max)
}
