//! Utility functions for transforms, audio files and formatting
//!
//! Provides helpers used by client applications: loading a file into
//! transform-ready channels, measuring reconstruction error and describing
//! a configured transform.

use crate::audio_io::{fit_to_length, read_audio_file, write_audio_file, AudioInfo};
use crate::nsgt::{Channels, Sample};
use crate::processor::NSGT;
use crate::window::{coherent_gain, power_gain};
use crate::Result;

/// Load an audio file as multichannel input of exactly `ls` samples.
///
/// `ls = None` keeps the file length. Shorter files are zero-padded and
/// longer ones truncated.
pub fn load_signal<P: AsRef<std::path::Path>>(
    path: P,
    ls: Option<usize>,
) -> Result<(AudioInfo, Channels<Vec<f64>>)> {
    let (info, mut channel_data) = read_audio_file(path.as_ref())?;
    log::info!(
        "Loaded audio: {} channels, {} Hz, {}",
        info.channels,
        info.sample_rate,
        format_duration(info.duration_samples, info.sample_rate)
    );

    if let Some(ls) = ls {
        if ls != info.duration_samples {
            log::warn!(
                "Fitting {} samples to signal length {}",
                info.duration_samples,
                ls
            );
        }
        fit_to_length(&mut channel_data, ls);
    }

    let info = AudioInfo::new(
        info.sample_rate,
        info.channels,
        channel_data.first().map_or(0, Vec::len),
    );
    Ok((info, Channels::Multi(channel_data)))
}

/// Save reconstructed channels as a float WAV file
pub fn save_signal<P: AsRef<std::path::Path>>(
    path: P,
    sample_rate: u32,
    signal: &Channels<Vec<f64>>,
) -> Result<()> {
    let channels = signal.as_slice();
    let info = AudioInfo::new(
        sample_rate,
        channels.len(),
        channels.first().map_or(0, Vec::len),
    );
    write_audio_file(path.as_ref(), &info, channels)?;
    log::info!(
        "Saved {} channels to {}",
        info.channels,
        path.as_ref().display()
    );
    Ok(())
}

/// Relative reconstruction error `||x - y|| / ||x||` (absolute if `x` is zero)
pub fn reconstruction_error<S: Sample>(original: &[S], reconstructed: &[S]) -> f64 {
    let mut diff = 0.0;
    let mut norm = 0.0;
    for (&x, &y) in original.iter().zip(reconstructed) {
        let (x, y) = (x.to_complex(), y.to_complex());
        diff += (x - y).norm_sqr();
        norm += x.norm_sqr();
    }

    if norm > 0.0 {
        (diff / norm).sqrt()
    } else {
        diff.sqrt()
    }
}

/// Largest sample-wise deviation
pub fn max_abs_error<S: Sample>(original: &[S], reconstructed: &[S]) -> f64 {
    original
        .iter()
        .zip(reconstructed)
        .map(|(&x, &y)| (x.to_complex() - y.to_complex()).norm())
        .fold(0.0, f64::max)
}

/// Format a frequency value for display
pub fn format_frequency(freq_hz: f64) -> String {
    if freq_hz.abs() >= 1000.0 {
        format!("{:.2} kHz", freq_hz / 1000.0)
    } else {
        format!("{:.1} Hz", freq_hz)
    }
}

/// Format a time value for display
pub fn format_time(time_sec: f64) -> String {
    if time_sec >= 60.0 {
        let minutes = (time_sec / 60.0).floor();
        let seconds = time_sec % 60.0;
        format!("{:.0}m {:.1}s", minutes, seconds)
    } else {
        format!("{:.2}s", time_sec)
    }
}

/// Format duration in samples to time string
pub fn format_duration(samples: usize, sample_rate: u32) -> String {
    format_time(samples as f64 / sample_rate as f64)
}

/// Describe a configured transform
pub fn transform_summary(nsgt: &NSGT) -> String {
    let config = nsgt.config();
    let mut summary = String::new();

    summary.push_str("NSGT Config:\n");
    summary.push_str(&format!(
        "  Sample rate: {}\n",
        format_frequency(config.fs)
    ));
    summary.push_str(&format!(
        "  Signal length: {} samples ({})\n",
        config.ls,
        format_time(config.ls as f64 / config.fs)
    ));
    summary.push_str(&format!(
        "  Mode: {}, {}, reduced form {}\n",
        if config.real { "real" } else { "complex" },
        if config.matrix_form { "matrix" } else { "ragged" },
        config.reduced_form
    ));

    let frequencies = nsgt.frequencies();
    if let (Some(first), Some(last)) = (frequencies.first(), frequencies.last()) {
        summary.push_str(&format!(
            "  Scale: {} bands, {} .. {}\n",
            frequencies.len(),
            format_frequency(*first),
            format_frequency(*last)
        ));
    }

    let kept = nsgt.kept_bands();
    let coefficients: usize = nsgt.bin_counts()[kept.clone()].iter().sum();
    summary.push_str(&format!(
        "  Bands: {} total, {} kept ({}..{})\n",
        nsgt.num_bands(),
        kept.len(),
        kept.start,
        kept.end
    ));
    summary.push_str(&format!(
        "  Coefficients per channel: {} ({:.2}x redundancy)\n",
        coefficients,
        coefficients as f64 / config.ls as f64
    ));

    summary.push_str("  Band details:\n");
    for k in kept {
        let window = &nsgt.windows()[k];
        summary.push_str(&format!(
            "    {:>3}: {:>12}  M = {:>6}  gain {:.1} / {:.1}\n",
            k,
            format_frequency(nsgt.band_frequency(k)),
            nsgt.bin_counts()[k],
            coherent_gain(window),
            power_gain(window)
        ));
    }

    summary
}

/// Named constant-Q settings
pub mod presets {
    /// Preset information structure
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PresetInfo {
        pub id: usize,
        pub name: &'static str,
        pub description: &'static str,
        pub fmin: f64,
        pub fmax: f64,
        pub bins: usize,
    }

    /// List all presets with detailed info
    pub fn list_presets() -> Vec<PresetInfo> {
        vec![
            PresetInfo {
                id: 0,
                name: "Default",
                description: "50 Hz - 22 kHz, 48 bins per octave",
                fmin: 50.0,
                fmax: 22050.0,
                bins: 48,
            },
            PresetInfo {
                id: 1,
                name: "Coarse",
                description: "80 Hz - 16 kHz, 12 bins per octave",
                fmin: 80.0,
                fmax: 16000.0,
                bins: 12,
            },
            PresetInfo {
                id: 2,
                name: "Music Analysis",
                description: "27.5 Hz - 8 kHz, 36 bins per octave",
                fmin: 27.5,
                fmax: 8000.0,
                bins: 36,
            },
            PresetInfo {
                id: 3,
                name: "Speech Analysis",
                description: "80 Hz - 8 kHz, 24 bins per octave",
                fmin: 80.0,
                fmax: 8000.0,
                bins: 24,
            },
            PresetInfo {
                id: 4,
                name: "Fine",
                description: "20 Hz - 20 kHz, 96 bins per octave",
                fmin: 20.0,
                fmax: 20000.0,
                bins: 96,
            },
        ]
    }

    pub fn get_preset(id: usize) -> Option<PresetInfo> {
        list_presets().into_iter().find(|p| p.id == id)
    }
}
