//! Circular placement of the band windows on the spectrum
//!
//! Every band window covers `len` consecutive positions of a circular
//! buffer of length `nn`, starting at `start`. Position `j` of that range
//! sits at offset `j - len / 2` from the band center. The helpers below are
//! the only place this offset convention is spelled out; analysis, synthesis
//! and the dual frame all go through them.

/// Circular index range of one band window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// First covered position, already reduced modulo `nn`
    pub start: usize,
    /// Number of covered positions (window length)
    pub len: usize,
    /// Center position of the band (modulo `nn`)
    pub center: usize,
}

impl Placement {
    /// Spectrum position of range index `j`
    #[inline]
    pub fn position(&self, j: usize, nn: usize) -> usize {
        (self.start + j) % nn
    }

    /// Iterate over `(j, position)` pairs of the covered range
    pub fn positions(&self, nn: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len).map(move |j| (j, self.position(j, nn)))
    }
}

/// Index into a buffer of length `modulus` for range index `j` of a window
/// of length `len`, i.e. `(j - len / 2) mod modulus`.
///
/// With `modulus == len` this picks the zero-centred window sample, with
/// `modulus == M` it picks the coefficient slot.
#[inline]
pub fn centered_index(j: usize, len: usize, modulus: usize) -> usize {
    (j + modulus - (len / 2) % modulus) % modulus
}

/// Compute the circular placement of each window.
///
/// `rfbas` holds the rounded band centers in spectrum bins. Returns the
/// placements and the total circular length `nn` (equal to `ls` for
/// centers inside `[0, ls]`).
pub fn calc_window_ranges(
    windows: &[Vec<f64>],
    rfbas: &[usize],
    ls: usize,
) -> (Vec<Placement>, usize) {
    debug_assert_eq!(windows.len(), rfbas.len());

    let first = rfbas.first().copied().unwrap_or(0);
    let last = rfbas.last().copied().unwrap_or(0);

    // the shift vector [(-rfbas[-1]) mod ls, diff(rfbas)] sums to nn
    let nn = match (ls - last % ls) % ls + last - first {
        0 => ls,
        nn => nn,
    };

    let placements = windows
        .iter()
        .zip(rfbas)
        .map(|(window, &center)| {
            let len = window.len();
            let center = (center + nn - first % nn) % nn;
            let start = (center + nn - (len / 2) % nn) % nn;
            Placement { start, len, center }
        })
        .collect();

    (placements, nn)
}
