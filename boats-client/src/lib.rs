//! Headless driver for the talking boats sketches.
//!
//! Runs a sketch for a fixed number of frames at a fixed frame rate, feeds it
//! a scripted list of gestures, records every audio parameter write and
//! reports the state of the simulation as it goes.

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use boats_core::{
    AudioEvent, Bounds, DrawList, FlockCommand, ImageId, RecordingAudio, SinkId, Sketch, Vector2D,
};
use boats_shared::{FrameReport, Preset, SketchSettings};
use serde::Serialize;

/// Number of boat bitmaps the browser sketch ships with
pub const BOAT_IMAGES: usize = 8;

/// Load settings from a JSON file, or the preset defaults when no file is given
pub fn load_settings(path: Option<&Path>, preset: Preset) -> Result<SketchSettings> {
    let Some(path) = path else {
        return Ok(SketchSettings::preset(preset));
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings = SketchSettings::from_json(&json)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Spawn,
    Erase,
}

/// A gesture scheduled for a given frame, written as `spawn@FRAME:X,Y` or
/// `erase@FRAME:X,Y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedGesture {
    pub frame: u64,
    pub kind: GestureKind,
    pub at: Vector2D,
}

impl FromStr for ScriptedGesture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, rest) = s
            .split_once('@')
            .with_context(|| format!("Gesture '{}' is missing '@FRAME'", s))?;
        let kind = match kind {
            "spawn" => GestureKind::Spawn,
            "erase" => GestureKind::Erase,
            other => bail!("Unknown gesture '{}', expected 'spawn' or 'erase'", other),
        };

        let (frame, point) = rest
            .split_once(':')
            .with_context(|| format!("Gesture '{}' is missing ':X,Y'", s))?;
        let frame: u64 = frame
            .parse()
            .with_context(|| format!("Invalid frame number in '{}'", s))?;

        let (x, y) = point
            .split_once(',')
            .with_context(|| format!("Gesture '{}' needs a point written as X,Y", s))?;
        let x: f32 = x.trim().parse().with_context(|| format!("Invalid x in '{}'", s))?;
        let y: f32 = y.trim().parse().with_context(|| format!("Invalid y in '{}'", s))?;

        Ok(Self {
            frame,
            kind,
            at: Vector2D::new(x, y),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub frames: u64,
    pub fps: f32,
    pub width: f32,
    pub height: f32,
    pub seed: u64,
    /// Frame on which the simulated start button is pressed
    pub start_audio_at: Option<u64>,
    /// Frame on which the simulated randomize button is pressed
    pub randomize_at: Option<u64>,
    /// Emit a report every N frames; 0 reports only the last frame
    pub report_every: u64,
    pub gestures: Vec<ScriptedGesture>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 60.0,
            width: 800.0,
            height: 600.0,
            seed: 0,
            start_audio_at: Some(0),
            randomize_at: None,
            report_every: 60,
            gestures: Vec::new(),
        }
    }
}

/// Totals over a whole headless run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub last: FrameReport,
    pub panner_ramps: usize,
    pub stereo_pans: usize,
    pub tempo_changes: usize,
    pub player_starts: usize,
    pub draw_commands: usize,
}

pub struct HeadlessRun {
    pub sketch: Sketch,
    pub audio: RecordingAudio,
    pub renderer: DrawList,
    options: RunOptions,
}

impl HeadlessRun {
    pub fn new(settings: SketchSettings, options: RunOptions) -> Result<Self> {
        if !(options.fps.is_finite() && options.fps > 0.0) {
            bail!("Frame rate must be positive, got {}", options.fps);
        }
        if !(options.width > 0.0 && options.height > 0.0) {
            bail!("Canvas must have a positive size, got {}x{}", options.width, options.height);
        }

        let boat_count = settings.boat_count;
        let stereo_channels = settings.stereo_channels;
        let mut sketch = Sketch::new(settings, Bounds::new(options.width, options.height), options.seed);

        let images: Vec<ImageId> = (0..BOAT_IMAGES).map(ImageId).collect();
        let boat_sinks: Vec<SinkId> = (0..boat_count).map(SinkId).collect();
        sketch.spawn_boats(&boat_sinks, &images);

        let stereo_sinks: Vec<SinkId> = (boat_count..boat_count + stereo_channels).map(SinkId).collect();
        sketch.bind_stereo_channels(&stereo_sinks);

        Ok(Self {
            sketch,
            audio: RecordingAudio::default(),
            renderer: DrawList::default(),
            options,
        })
    }

    /// Run every frame, handing each due report to `emit`
    pub fn run<F>(&mut self, mut emit: F) -> Result<RunSummary>
    where
        F: FnMut(&FrameReport) -> Result<()>,
    {
        let mut summary = RunSummary {
            last: self.sketch.report(),
            panner_ramps: 0,
            stereo_pans: 0,
            tempo_changes: 0,
            player_starts: 0,
            draw_commands: 0,
        };

        for frame in 0..self.options.frames {
            if self.options.start_audio_at == Some(frame) {
                self.sketch.start_audio(&mut self.audio);
            }
            if self.options.randomize_at == Some(frame) {
                self.sketch.randomize(&mut self.audio);
            }
            for gesture in self.options.gestures.iter().filter(|g| g.frame == frame) {
                let command = match gesture.kind {
                    GestureKind::Spawn => FlockCommand::Spawn { at: gesture.at },
                    GestureKind::Erase => FlockCommand::Erase {
                        at: gesture.at,
                        radius: self.sketch.settings().birds.erase_radius,
                    },
                };
                self.sketch.queue(command);
            }

            let report = self
                .sketch
                .tick(self.options.fps, &mut self.audio, &mut self.renderer);

            for event in self.audio.take_events() {
                match event {
                    AudioEvent::Ramp { .. } => summary.panner_ramps += 1,
                    AudioEvent::StereoPan { .. } => summary.stereo_pans += 1,
                    AudioEvent::StartPlayer { .. } => summary.player_starts += 1,
                    AudioEvent::Bpm(bpm) => log::debug!("frame {}: transport at {:.2} BPM", frame, bpm),
                    AudioEvent::Resume | AudioEvent::PlaybackRate(_) => {}
                }
            }
            if report.tempo_changed {
                summary.tempo_changes += 1;
            }

            let due = self.options.report_every > 0 && report.frame % self.options.report_every == 0;
            if due || frame + 1 == self.options.frames {
                emit(&report)?;
            }
            summary.last = report;
        }

        summary.draw_commands = self.renderer.commands.len();
        log::info!(
            "ran {} frames: {} birds, {} boats, {} panner ramps",
            summary.last.frame,
            summary.last.birds,
            summary.last.boats,
            summary.panner_ramps
        );
        Ok(summary)
    }
}
