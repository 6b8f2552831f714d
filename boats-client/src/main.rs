use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use boats_client::{load_settings, HeadlessRun, RunOptions, ScriptedGesture};
use boats_shared::Preset;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    TalkingBoats,
    NineVoices,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::TalkingBoats => Preset::TalkingBoats,
            PresetArg::NineVoices => Preset::NineVoices,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a talking boats sketch headless", long_about = None)]
struct Args {
    /// Sketch preset used when no settings file is given
    #[arg(short, long, value_enum, default_value = "talking-boats")]
    preset: PresetArg,

    /// JSON settings file; missing fields fall back to the file's preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short = 'n', long, default_value_t = 600)]
    frames: u64,

    /// Simulated display refresh rate, drives the transport tempo
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    #[arg(long, default_value_t = 800.0)]
    width: f32,

    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Random seed; equal seeds give identical runs
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Frame on which the start button is pressed
    #[arg(long, default_value_t = 0)]
    start_at: u64,

    /// Never press the start button
    #[arg(long)]
    silent: bool,

    /// Frame on which the randomize button is pressed
    #[arg(long)]
    randomize_at: Option<u64>,

    /// Print a report every N frames (0: only the last frame)
    #[arg(short, long, default_value_t = 60)]
    report_every: u64,

    /// Scripted gesture, e.g. 'spawn@10:200,150' or 'erase@90:200,150'. Repeatable.
    #[arg(short, long = "gesture")]
    gestures: Vec<ScriptedGesture>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let settings = load_settings(args.config.as_deref(), args.preset.into())
        .context("Failed to load settings")?;
    log::info!("Talking boats starting...");
    log::info!("Preset: {:?}", settings.preset);
    log::info!("Frames: {} at {} fps", args.frames, args.fps);

    let options = RunOptions {
        frames: args.frames,
        fps: args.fps,
        width: args.width,
        height: args.height,
        seed: args.seed,
        start_audio_at: (!args.silent).then_some(args.start_at),
        randomize_at: args.randomize_at,
        report_every: args.report_every,
        gestures: args.gestures,
    };

    let mut run = HeadlessRun::new(settings, options).context("Failed to set up sketch")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = run
        .run(|report| {
            serde_json::to_writer(&mut out, report)?;
            writeln!(out)?;
            Ok(())
        })
        .context("Simulation error")?;

    serde_json::to_writer_pretty(&mut out, &summary)?;
    writeln!(out)?;

    Ok(())
}
