//! NSGT Audio Analyzer CLI
//!
//! Command-line interface for the NSGT library.
//! Provides an interactive shell for constant-Q analysis and resynthesis
//! of audio files.

use std::process;

use clap::{Arg, ArgAction, Command};
use nsgt_lib::{
    audio_io::AudioInfo,
    nsgt::{Channels, Coefficients, NSGTConfig},
    utils::{self, presets},
    CQNSGT,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[cfg(feature = "image")]
use nsgt_lib::spectrogram::{
    image::{save_coefficient_map, CoefficientImageOptions, ColorMap},
    CoefficientMap,
};

/// Scale and transform settings, applied when the transform is (re)built
#[derive(Debug, Clone, Copy)]
struct Settings {
    fmin: f64,
    fmax: f64,
    bins: usize,
    config: NSGTConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let preset = presets::list_presets()[0];
        Self {
            fmin: preset.fmin,
            fmax: preset.fmax,
            bins: preset.bins,
            config: NSGTConfig::default().with_multichannel(true),
        }
    }
}

/// Application state
struct AppState {
    settings: Settings,
    audio: Option<(AudioInfo, Channels<Vec<f64>>)>,
    transform: Option<CQNSGT>,
    coefficients: Option<Channels<Coefficients>>,
    reconstruction: Option<Channels<Vec<f64>>>,
    current_file: Option<String>,
}

impl AppState {
    fn new() -> Self {
        Self {
            settings: Settings::default(),
            audio: None,
            transform: None,
            coefficients: None,
            reconstruction: None,
            current_file: None,
        }
    }

    /// Drop everything derived from the current settings
    fn invalidate(&mut self) {
        self.transform = None;
        self.coefficients = None;
        self.reconstruction = None;
    }

    /// Build the transform for the current settings unless it exists
    fn ensure_transform(&mut self) -> Result<&CQNSGT, String> {
        if self.transform.is_none() {
            let s = self.settings;
            println!(
                "Building transform: {} - {}, {} bins/octave, Ls = {}",
                utils::format_frequency(s.fmin),
                utils::format_frequency(s.fmax),
                s.bins,
                s.config.ls
            );
            let transform =
                CQNSGT::new(s.fmin, s.fmax, s.bins, s.config).map_err(|e| e.to_string())?;
            self.transform = Some(transform);
        }
        self.transform
            .as_ref()
            .ok_or_else(|| "Transform not available".to_string())
    }

    fn run_forward(&mut self) -> Result<(), String> {
        let signal = match &self.audio {
            Some((_, signal)) => signal.clone(),
            None => return Err("No audio loaded. Load a file first.".to_string()),
        };
        let coefficients = self
            .ensure_transform()?
            .forward(&signal)
            .map_err(|e| e.to_string())?;

        for (ch, c) in coefficients.as_slice().iter().enumerate() {
            println!(
                "  Channel {}: {} bands, {} coefficients, energy {:.4e}",
                ch,
                c.num_bands(),
                c.band_lengths().iter().sum::<usize>(),
                c.energy()
            );
        }
        self.coefficients = Some(coefficients);
        self.reconstruction = None;
        Ok(())
    }

    fn run_backward(&mut self) -> Result<(), String> {
        let coefficients = self
            .coefficients
            .take()
            .ok_or_else(|| "No coefficients. Run 'forward' first.".to_string())?;
        let result: Result<Channels<Vec<f64>>, String> = self
            .ensure_transform()
            .and_then(|t| t.backward(&coefficients).map_err(|e| e.to_string()));
        self.coefficients = Some(coefficients);

        let reconstruction = result?;
        if let Some((_, original)) = &self.audio {
            for (ch, (x, y)) in original
                .as_slice()
                .iter()
                .zip(reconstruction.as_slice())
                .enumerate()
            {
                println!(
                    "  Channel {}: relative error {:.3e}, max deviation {:.3e}",
                    ch,
                    utils::reconstruction_error(x, y),
                    utils::max_abs_error(x, y)
                );
            }
        }
        self.reconstruction = Some(reconstruction);
        Ok(())
    }
}

/// Print the help message showing available commands
fn print_help() {
    println!("Available commands:");
    println!("  load <filename>                    - Load an audio file (sets fs and signal length)");
    println!("  save <filename>                    - Save the reconstructed audio to a WAV file");
    println!("  config                             - Show current settings");
    println!("  set fmin <hz>                      - Set lowest scale frequency");
    println!("  set fmax <hz>                      - Set highest scale frequency");
    println!("  set bins <n>                       - Set bins per octave");
    println!("  set ls <samples>                   - Set signal length (pads or truncates audio)");
    println!("  set matrix <on|off>                - Uniform bin count (coefficient matrix)");
    println!("  set reduced <0|1|2>                - Drop edge bands per half-spectrum");
    println!("  set real <on|off>                  - Keep only non-negative frequencies");
    println!("  set measure <on|off>               - Record FFT timings");
    println!("  preset <n>                         - Load a scale preset");
    println!("  presets                            - List available presets");
    println!("  bands                              - Build the transform and show its bands");
    println!("  forward                            - Compute coefficients of the loaded audio");
    println!("  backward                           - Reconstruct audio from the coefficients");
    println!("  roundtrip                          - forward + backward with error report");
    println!("  timings                            - Show recorded FFT timings");
    println!("  spectrogram <filename> [channel] [colormap] [width]");
    println!("                                     - Render coefficients as an image");
    println!("  help                               - Show this help message");
    println!("  quit                               - Exit the program");
    println!();
    println!("Examples:");
    println!("  load test.wav");
    println!("  set bins 24");
    println!("  preset 2");
    println!("  roundtrip");
    println!("  spectrogram cq.png 0 inferno 1200");
    println!("  save resynth.wav");
}

fn parse_switch(value: &str) -> Option<bool> {
    match value {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Apply a `set <param> <value>` command to the settings
fn apply_setting(settings: &mut Settings, param: &str, value: &str) -> Result<String, String> {
    let invalid = || format!("Invalid value for {}: {}", param, value);

    match param {
        "fmin" => {
            settings.fmin = value.parse().map_err(|_| invalid())?;
            Ok(format!("fmin set to {}", utils::format_frequency(settings.fmin)))
        }
        "fmax" => {
            settings.fmax = value.parse().map_err(|_| invalid())?;
            Ok(format!("fmax set to {}", utils::format_frequency(settings.fmax)))
        }
        "bins" => {
            settings.bins = value.parse().map_err(|_| invalid())?;
            Ok(format!("Bins per octave set to {}", settings.bins))
        }
        "ls" => {
            let ls: usize = value.parse().map_err(|_| invalid())?;
            let config = NSGTConfig { ls, ..settings.config };
            config.validate().map_err(|e| e.to_string())?;
            settings.config = config;
            Ok(format!("Signal length set to {}", ls))
        }
        "matrix" => {
            settings.config.matrix_form = parse_switch(value).ok_or_else(invalid)?;
            Ok(format!("Matrix form: {}", settings.config.matrix_form))
        }
        "reduced" => {
            let reduced: usize = value.parse().map_err(|_| invalid())?;
            let config = settings.config.with_reduced_form(reduced);
            config.validate().map_err(|e| e.to_string())?;
            settings.config = config;
            Ok(format!("Reduced form set to {}", reduced))
        }
        "real" => {
            settings.config.real = parse_switch(value).ok_or_else(invalid)?;
            Ok(format!("Real mode: {}", settings.config.real))
        }
        "measure" => {
            settings.config.measure_fft = parse_switch(value).ok_or_else(invalid)?;
            Ok(format!("FFT timing: {}", settings.config.measure_fft))
        }
        _ => Err(format!(
            "Unknown parameter: {}. Parameters: fmin, fmax, bins, ls, matrix, reduced, real, measure",
            param
        )),
    }
}

fn load_file(state: &mut AppState, filename: &str) {
    println!("Loading file: {}", filename);
    match utils::load_signal(filename, None) {
        Ok((info, signal)) => {
            state.settings.config.fs = info.sample_rate as f64;
            state.settings.config.ls = info.duration_samples;
            state.audio = Some((info, signal));
            state.current_file = Some(filename.to_string());
            state.invalidate();
            println!("File loaded successfully!");
        }
        Err(e) => println!("Error loading file: {}", e),
    }
}

/// Process a user command
fn process_command(command: &str, state: &mut AppState) {
    let parts: Vec<&str> = command.split_whitespace().collect();

    if parts.is_empty() {
        return;
    }

    match parts[0] {
        "load" => {
            if parts.len() != 2 {
                println!("Usage: load <filename>");
                return;
            }
            load_file(state, parts[1]);
        }

        "save" => {
            if parts.len() != 2 {
                println!("Usage: save <filename>");
                return;
            }

            let Some(reconstruction) = &state.reconstruction else {
                println!("Nothing to save. Run 'backward' or 'roundtrip' first.");
                return;
            };

            let filename = parts[1];
            println!("Saving to file: {}", filename);
            let sample_rate = state.settings.config.fs.round() as u32;
            match utils::save_signal(filename, sample_rate, reconstruction) {
                Ok(_) => println!("File saved successfully!"),
                Err(e) => println!("Error saving file: {}", e),
            }
        }

        "config" => {
            let s = &state.settings;
            println!("Current Settings:");
            println!("  fmin: {}", utils::format_frequency(s.fmin));
            println!("  fmax: {}", utils::format_frequency(s.fmax));
            println!("  Bins per octave: {}", s.bins);
            println!("  Sample rate: {} Hz", s.config.fs);
            println!("  Signal length: {} samples", s.config.ls);
            println!("  Real: {}", s.config.real);
            println!("  Matrix form: {}", s.config.matrix_form);
            println!("  Reduced form: {}", s.config.reduced_form);
            println!("  FFT timing: {}", s.config.measure_fft);
            if let Some(file) = &state.current_file {
                println!("  File: {}", file);
            }
        }

        "set" => {
            if parts.len() < 3 {
                println!("Usage: set <parameter> <value>");
                println!("Parameters: fmin, fmax, bins, ls, matrix, reduced, real, measure");
                return;
            }

            match apply_setting(&mut state.settings, parts[1], parts[2]) {
                Ok(message) => {
                    if parts[1] == "ls" {
                        let ls = state.settings.config.ls;
                        if let Some((info, signal)) = &mut state.audio {
                            let mut channels = std::mem::replace(signal, Channels::Multi(Vec::new()))
                                .into_vec();
                            nsgt_lib::audio_io::fit_to_length(&mut channels, ls);
                            *signal = Channels::Multi(channels);
                            *info = AudioInfo::new(info.sample_rate, info.channels, ls);
                        }
                    }
                    state.invalidate();
                    println!("{}", message);
                }
                Err(e) => println!("Error: {}", e),
            }
        }

        "preset" => {
            if parts.len() != 2 {
                println!("Usage: preset <n>");
                return;
            }

            match parts[1].parse::<usize>().ok().and_then(presets::get_preset) {
                Some(preset) => {
                    state.settings.fmin = preset.fmin;
                    state.settings.fmax = preset.fmax;
                    state.settings.bins = preset.bins;
                    state.invalidate();
                    println!("Loaded preset: {} ({})", preset.name, preset.description);
                }
                None => println!("Unknown preset: {}. Use 'presets' to list them.", parts[1]),
            }
        }

        "presets" => {
            println!("Available presets:");
            for preset in presets::list_presets() {
                println!("  {}: {:<16} {}", preset.id, preset.name, preset.description);
            }
        }

        "bands" => match state.ensure_transform() {
            Ok(transform) => println!("{}", utils::transform_summary(transform)),
            Err(e) => println!("Error building transform: {}", e),
        },

        "forward" => {
            println!("Running forward transform...");
            if let Err(e) = state.run_forward() {
                println!("Error: {}", e);
            }
        }

        "backward" => {
            println!("Running backward transform...");
            if let Err(e) = state.run_backward() {
                println!("Error: {}", e);
            }
        }

        "roundtrip" => {
            println!("Running forward and backward transforms...");
            if let Err(e) = state.run_forward().and_then(|_| state.run_backward()) {
                println!("Error: {}", e);
            }
        }

        "timings" => match &state.transform {
            Some(transform) if transform.config().measure_fft => {
                let timings = transform.fft_timings();
                if timings.is_empty() {
                    println!("No FFTs run yet.");
                }
                for t in timings {
                    println!(
                        "  size {:>8}: {:>6} calls, total {:?}, mean {:?}",
                        t.size,
                        t.calls,
                        t.total,
                        t.mean()
                    );
                }
            }
            Some(_) => println!("FFT timing is off. Use 'set measure on'."),
            None => println!("No transform built yet."),
        },

        "spectrogram" => {
            #[cfg(feature = "image")]
            {
                if parts.len() < 2 {
                    println!("Usage: spectrogram <filename> [channel] [colormap] [width]");
                    println!("  channel: 0, 1, ... (default: 0)");
                    println!("  colormap: viridis, inferno, grayscale, jet (default: viridis)");
                    println!("  width: image width in pixels (default: 1000)");
                    return;
                }

                let filename = parts[1];
                let channel = parts.get(2).and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
                let colormap = parts
                    .get(3)
                    .map(|name| {
                        ColorMap::from_name(name).unwrap_or_else(|| {
                            println!("Unknown colormap: {}. Using viridis.", name);
                            ColorMap::Viridis
                        })
                    })
                    .unwrap_or(ColorMap::Viridis);
                let width = parts
                    .get(4)
                    .and_then(|w| w.parse::<usize>().ok())
                    .unwrap_or(1000);

                let (Some(coefficients), Some(transform)) = (&state.coefficients, &state.transform)
                else {
                    println!("No coefficients. Run 'forward' first.");
                    return;
                };
                let Some(c) = coefficients.as_slice().get(channel) else {
                    println!("Invalid channel: {}", channel);
                    return;
                };

                let frequencies: Vec<f64> = transform
                    .kept_bands()
                    .map(|k| transform.band_frequency(k))
                    .collect();
                let duration = transform.config().ls as f64 / transform.config().fs;
                let map = match CoefficientMap::from_coefficients(c, width)
                    .and_then(|m| m.with_frequencies(frequencies))
                {
                    Ok(map) => map.with_duration(duration),
                    Err(e) => {
                        println!("Error generating image: {}", e);
                        return;
                    }
                };
                if let Some(band) = map.loudest_band() {
                    let axis = map.frequency_axis();
                    println!(
                        "  Loudest band: {} ({})",
                        band,
                        utils::format_frequency(axis[band])
                    );
                }

                let options = CoefficientImageOptions {
                    colormap,
                    ..Default::default()
                };
                match save_coefficient_map(&map, filename, &options) {
                    Ok(_) => println!("Coefficient image saved to {}", filename),
                    Err(e) => println!("Error generating image: {}", e),
                }
            }

            #[cfg(not(feature = "image"))]
            {
                println!("Image support is not enabled. Rebuild with --features image");
            }
        }

        "help" => print_help(),

        "quit" | "exit" => {
            println!("Goodbye!");
            process::exit(0);
        }

        _ => {
            println!("Unknown command: {}", parts[0]);
            println!("Type 'help' for available commands");
        }
    }
}

fn main() {
    // Parse command line arguments
    let matches = Command::new("NSGT Audio Analyzer")
        .version(nsgt_lib::VERSION)
        .about("Constant-Q non-stationary Gabor transform tool")
        .arg(
            Arg::new("file")
                .help("Audio file to load on startup")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("fmin")
                .long("fmin")
                .help("Lowest scale frequency in Hz")
                .value_name("HZ"),
        )
        .arg(
            Arg::new("fmax")
                .long("fmax")
                .help("Highest scale frequency in Hz")
                .value_name("HZ"),
        )
        .arg(
            Arg::new("bins")
                .long("bins")
                .short('b')
                .help("Bins per octave")
                .value_name("N"),
        )
        .arg(
            Arg::new("reduced")
                .long("reduced")
                .short('r')
                .help("Edge bands to drop per half-spectrum (0, 1 or 2)")
                .value_name("N"),
        )
        .arg(
            Arg::new("matrix")
                .long("matrix")
                .short('m')
                .help("Use a uniform bin count (coefficient matrix)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("complex")
                .long("complex")
                .help("Keep negative-frequency bands")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("measure-fft")
                .long("measure-fft")
                .help("Record FFT timings")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    println!("NSGT Audio Analyzer v{}", nsgt_lib::VERSION);
    println!("Type 'help' for available commands\n");

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut state = AppState::new();

    // Apply command line configuration
    for param in ["fmin", "fmax", "bins", "reduced"] {
        if let Some(value) = matches.get_one::<String>(param) {
            match apply_setting(&mut state.settings, param, value) {
                Ok(message) => println!("{}", message),
                Err(e) => eprintln!("{}", e),
            }
        }
    }
    state.settings.config.matrix_form = matches.get_flag("matrix");
    state.settings.config.real = !matches.get_flag("complex");
    state.settings.config.measure_fft = matches.get_flag("measure-fft");

    // Load file from command line if provided
    if let Some(filename) = matches.get_one::<String>("file") {
        load_file(&mut state, filename);
    }

    // Setup readline
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create readline: {}", e);
            process::exit(1);
        }
    };

    // Main command loop
    loop {
        let readline = rl.readline("nsgt> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    rl.add_history_entry(trimmed).ok();
                    process_command(trimmed, &mut state);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
}
