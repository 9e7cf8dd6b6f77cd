//! Audio I/O functionality using Symphonia
//!
//! Decodes any format Symphonia supports into per-channel `f64` signals and
//! writes reconstructions back as 32-bit float WAV through hound.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::NSGTError;
use crate::Result;

/// Audio metadata information
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_samples: usize,
    pub duration_seconds: f64,
}

impl AudioInfo {
    pub fn new(sample_rate: u32, channels: usize, duration_samples: usize) -> Self {
        let duration_seconds = duration_samples as f64 / sample_rate as f64;
        Self {
            sample_rate,
            channels,
            duration_samples,
            duration_seconds,
        }
    }
}

fn audio_err(context: &str, err: impl std::fmt::Display) -> NSGTError {
    NSGTError::Audio(format!("{}: {}", context, err))
}

/// Decode every packet of the default track into planar channels
fn read_audio_stream(mss: MediaSourceStream) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| audio_err("Unrecognized format", e))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| NSGTError::Audio("No default track found".to_string()))?;
    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| NSGTError::Audio("Sample rate not specified".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| NSGTError::Audio("Channels not specified".to_string()))?
        .count();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| audio_err("Unsupported codec", e))?;

    let mut channel_buffers: Vec<Vec<f64>> = vec![Vec::new(); channels];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(err) => return Err(audio_err("Read failed", err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(err)) => {
                log::warn!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(err) => return Err(audio_err("Decode failed", err)),
        };

        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }
        let mut planar = SampleBuffer::<f64>::new(decoded.capacity() as u64, *decoded.spec());
        planar.copy_planar_ref(decoded);

        for (c, buffer) in channel_buffers.iter_mut().enumerate() {
            buffer.extend_from_slice(&planar.samples()[c * frames..(c + 1) * frames]);
        }
    }

    let duration_samples = channel_buffers.first().map_or(0, Vec::len);
    let info = AudioInfo::new(sample_rate, channels, duration_samples);
    log::debug!(
        "Decoded {} channels x {} samples at {} Hz",
        channels,
        duration_samples,
        sample_rate
    );

    Ok((info, channel_buffers))
}

/// Read audio file from filesystem path
pub fn read_audio_file<P: AsRef<Path>>(path: P) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let file = File::open(path.as_ref())
        .map_err(|e| audio_err(&path.as_ref().display().to_string(), e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_audio_stream(mss)
}

/// Read audio data from byte buffer
pub fn read_audio_bytes(data: Vec<u8>) -> Result<(AudioInfo, Vec<Vec<f64>>)> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    read_audio_stream(mss)
}

/// Interleave channels into a float WAV stream
fn write_wav<W: Write + Seek>(
    writer: W,
    audio_info: &AudioInfo,
    channel_data: &[Vec<f64>],
) -> Result<()> {
    if channel_data.len() != audio_info.channels {
        return Err(NSGTError::Audio(format!(
            "Channel count mismatch: expected {}, got {}",
            audio_info.channels,
            channel_data.len()
        )));
    }

    let spec = WavSpec {
        channels: audio_info.channels as u16,
        sample_rate: audio_info.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut wav = WavWriter::new(writer, spec).map_err(|e| audio_err("WAV header", e))?;

    let num_samples = channel_data.iter().map(Vec::len).min().unwrap_or(0);
    for sample_idx in 0..num_samples {
        for channel in channel_data {
            wav.write_sample(channel[sample_idx] as f32)
                .map_err(|e| audio_err("WAV write", e))?;
        }
    }

    wav.finalize().map_err(|e| audio_err("WAV finalize", e))
}

/// Write audio data to WAV file
pub fn write_audio_file<P: AsRef<Path>>(
    path: P,
    audio_info: &AudioInfo,
    channel_data: &[Vec<f64>],
) -> Result<()> {
    let file = File::create(path.as_ref())
        .map_err(|e| audio_err(&path.as_ref().display().to_string(), e))?;
    write_wav(BufWriter::new(file), audio_info, channel_data)
}

/// Write audio data to WAV format in memory and return bytes
pub fn write_audio_bytes(audio_info: &AudioInfo, channel_data: &[Vec<f64>]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, audio_info, channel_data)?;
    Ok(cursor.into_inner())
}

/// Truncate or zero-pad every channel to `ls` samples
pub fn fit_to_length(channel_data: &mut [Vec<f64>], ls: usize) {
    for channel in channel_data.iter_mut() {
        channel.resize(ls, 0.0);
    }
}
