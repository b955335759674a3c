//! speakwave main entry point
//!
//! Reads a base64 speech payload saved from the generator (a file, or
//! stdin), writes it out as `<name>.wav`, and plays it through the
//! default output device until it finishes.

use log::{debug, error, info, warn};
use serde::Serialize;
use speakwave::audio::{wav, WavHeader};
use speakwave::playback::backends::manual::ManualEngine;
use speakwave::playback::{create_engine, AudioEngine, PlaybackController};
use speakwave::speech::{PayloadFile, Speaker};
use speakwave::state::Config;
use speakwave::{Result, SpeakwaveError};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

/// Extra time allowed past the audio length before giving up on completion
const COMPLETION_GRACE: Duration = Duration::from_secs(2);

const USAGE: &str = "Usage: speakwave [--debug] [--no-play] [--json] [--name NAME] [--out DIR] [PAYLOAD]

Decodes a base64 16-bit PCM speech payload, writes NAME.wav and plays it.
PAYLOAD is a file containing the payload; omit it or pass - to read stdin.";

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct Options {
    debug: bool,
    no_play: bool,
    json: bool,
    help: bool,
    name: Option<String>,
    out: Option<PathBuf>,
    payload: Option<String>,
}

/// One-line report printed after a run
#[derive(Debug, Serialize)]
struct Summary {
    file: PathBuf,
    bytes: usize,
    duration_secs: f64,
    played: bool,
    header: WavHeader,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" | "-d" => options.debug = true,
            "--no-play" => options.no_play = true,
            "--json" => options.json = true,
            "--help" | "-h" => options.help = true,
            "--name" | "-n" => {
                let name = iter.next().ok_or("--name requires a value")?;
                options.name = Some(name.clone());
            }
            "--out" | "-o" => {
                let dir = iter.next().ok_or("--out requires a directory")?;
                options.out = Some(PathBuf::from(dir));
            }
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(SpeakwaveError::Other(format!("Unknown option: {}", flag)));
            }
            payload => {
                if options.payload.is_some() {
                    return Err("Only one payload may be given".into());
                }
                options.payload = Some(payload.to_string());
            }
        }
    }

    Ok(options)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if options.help {
        println!("{}", USAGE);
        return;
    }

    // Initialize logger
    if options.debug {
        // Debug mode: write to speakwave.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("speakwave.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open speakwave.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "speakwave version {} starting (debug mode, logging to speakwave.log)",
            speakwave::VERSION
        );
    } else {
        // Normal mode: errors by default, RUST_LOG may raise verbosity
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run(options) {
        error!("Fatal error: {}", e);
        eprintln!("Error: speech processing failed: {}", e);
        process::exit(1);
    }
}

fn run(options: Options) -> Result<()> {
    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.path());

    let play = !options.no_play && config.playback_enabled();
    let engine: Box<dyn AudioEngine> = if play {
        create_engine(&config.device())
    } else {
        debug!("Playback disabled");
        Box::new(ManualEngine::new().0)
    };

    let source = PayloadFile::from_arg(options.payload.as_deref().unwrap_or("-"));
    let mut speaker = Speaker::from_config(source, PlaybackController::new(engine), &config);

    // Saved payloads ignore the request text
    let audio = speaker.generate("")?;

    let name = options.name.unwrap_or_else(|| config.file_name());
    let dir = options.out.unwrap_or_else(|| config.output_dir());
    let path = dir.join(wav::file_name(&name));
    std::fs::write(&path, audio.wav.as_bytes())?;
    info!("Wrote {} ({} bytes)", path.display(), audio.wav.len());

    let duration = audio.buffer.duration();
    let summary = Summary {
        file: path,
        bytes: audio.wav.len(),
        duration_secs: duration.as_secs_f64(),
        played: play,
        header: audio.wav.header(),
    };

    if play {
        speaker.play(audio.buffer)?;
        if !speaker.wait_until_idle(duration + COMPLETION_GRACE) {
            warn!("Playback did not report completion, stopping");
            speaker.stop();
        }
    }

    if options.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "Wrote {} ({} bytes, {:.2}s, {} Hz, {} ch)",
            summary.file.display(),
            summary.bytes,
            summary.duration_secs,
            summary.header.sample_rate,
            summary.header.channels
        );
    }

    Ok(())
}
