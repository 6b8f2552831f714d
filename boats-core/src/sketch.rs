use boats_shared::{FrameReport, SketchSettings};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::audio::{AudioEngine, SinkId};
use crate::boat::{spawn_boat, update_audio_positions, update_stereo_pans};
use crate::boid::{Boid, BoidConfig, Bounds, EdgePolicy};
use crate::flock::{Flock, FlockCommand};
use crate::input::{GestureTracker, PointerEvent};
use crate::render::{ImageId, Renderer};
use crate::tempo::{RandomizePlan, TempoController};

/// Everything one running sketch owns. The driver holds a `Sketch`, feeds it
/// input between frames and calls `tick` once per display refresh.
pub struct Sketch {
    settings: SketchSettings,
    pub birds: Flock,
    pub boats: Flock,
    bounds: Bounds,
    gestures: GestureTracker,
    tempo: TempoController,
    stereo_channels: Vec<SinkId>,
    players: Vec<SinkId>,
    frame: u64,
    audio_started: bool,
    rng: StdRng,
}

impl Sketch {
    pub fn new(mut settings: SketchSettings, bounds: Bounds, seed: u64) -> Self {
        settings.sanitize();
        let edge_policy = EdgePolicy::from(settings.edge_policy);

        let birds = Flock::from_settings(&settings.birds, edge_policy);
        let boats = Flock::new(BoidConfig::from(&settings.birds), edge_policy);
        let initial_birds = settings.initial_birds;

        let mut sketch = Self {
            gestures: GestureTracker::new(settings.birds.erase_radius),
            tempo: TempoController::new(settings.tempo.clone()),
            settings,
            birds,
            boats,
            bounds,
            stereo_channels: Vec::new(),
            players: Vec::new(),
            frame: 0,
            audio_started: false,
            rng: StdRng::seed_from_u64(seed),
        };
        sketch.spawn_birds(initial_birds);
        sketch.tempo.sync_population(sketch.birds.len());

        log::info!(
            "sketch {:?} on {}x{} canvas with {} birds",
            sketch.settings.preset,
            bounds.width,
            bounds.height,
            sketch.birds.len()
        );
        sketch
    }

    /// Scatter `count` birds over the canvas, stopping at the population cap.
    /// Returns how many were added.
    pub fn spawn_birds(&mut self, count: usize) -> usize {
        let mut added = 0;
        for _ in 0..count {
            let boid = Boid::random(self.bounds, &self.settings.birds, &mut self.rng);
            if self.birds.add_boid(boid).is_err() {
                break;
            }
            added += 1;
        }
        added
    }

    /// One boat per voice, up to the configured boat count. Images are
    /// shuffled and handed out round-robin, so boats share bitmaps when there
    /// are fewer images than voices.
    pub fn spawn_boats(&mut self, sinks: &[SinkId], images: &[ImageId]) {
        let mut pool = images.to_vec();
        pool.shuffle(&mut self.rng);
        let bias = if self.settings.birds.legacy_boat_cohesion { 1.0 } else { 0.0 };

        for (i, sink) in sinks.iter().take(self.settings.boat_count).enumerate() {
            let image = (!pool.is_empty()).then(|| pool[i % pool.len()]);
            let boat = spawn_boat(
                self.bounds,
                &self.settings.boats,
                Some(*sink),
                image,
                bias,
                &mut self.rng,
            );
            if self.boats.add_agent(boat).is_ok() {
                self.players.push(*sink);
            }
        }
        log::debug!("spawned {} boats", self.boats.len());
    }

    /// Voices whose stereo pan follows the first birds' x positions
    pub fn bind_stereo_channels(&mut self, channels: &[SinkId]) {
        let count = channels.len().min(self.settings.stereo_channels);
        self.players.retain(|sink| !self.stereo_channels.contains(sink));
        self.stereo_channels = channels[..count].to_vec();
        self.players.extend_from_slice(&self.stereo_channels);
    }

    pub fn queue(&mut self, command: FlockCommand) {
        self.birds.queue(command);
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        if let Some(command) = self.gestures.handle(event) {
            self.birds.queue(command);
        }
    }

    /// Advance one frame: apply queued input, steer both flocks against their
    /// combined neighbourhood, move the panners, draw, and retune the
    /// transport if the population changed.
    pub fn tick(&mut self, fps: f32, engine: &mut dyn AudioEngine, renderer: &mut dyn Renderer) -> FrameReport {
        let applied = self.birds.apply_pending(&mut self.rng);
        if applied.changed_population() {
            self.tempo.mark_dirty();
        }

        let mut neighbors = self.birds.snapshot();
        neighbors.extend(self.boats.boids().copied());
        self.birds.run(&neighbors, self.bounds);
        self.boats.run(&neighbors, self.bounds);

        update_audio_positions(&mut self.boats, self.bounds, engine);
        update_stereo_pans(&self.birds, &self.stereo_channels, self.bounds.width, engine);

        renderer.clear();
        self.birds.render(renderer);
        self.boats.render(renderer);

        let update = self.tempo.observe(fps, self.birds.len(), self.audio_started);
        if let Some(update) = update {
            engine.set_bpm(update.bpm);
            engine.set_playback_rate(update.playback_rate);
        }

        self.frame += 1;
        FrameReport {
            tempo_changed: update.is_some(),
            ..self.report()
        }
    }

    /// Unlock audio and start every voice. Does nothing once started.
    pub fn start_audio(&mut self, engine: &mut dyn AudioEngine) -> bool {
        if self.audio_started {
            return false;
        }
        engine.resume();
        engine.set_bpm(self.tempo.last_applied());
        let rate = self.tempo.playback_rate();
        for sink in &self.players {
            engine.start_player(*sink, 0.0, rate);
        }
        self.audio_started = true;
        log::info!(
            "audio started with {} voices at {:.2} BPM",
            self.players.len(),
            self.tempo.last_applied()
        );
        true
    }

    /// Restart every voice with a random tempo, start offset and rate,
    /// unlocking audio first if needed
    pub fn randomize(&mut self, engine: &mut dyn AudioEngine) -> RandomizePlan {
        if !self.audio_started {
            engine.resume();
            self.audio_started = true;
        }

        let plan = self.tempo.randomize(&mut self.rng, self.players.len());
        engine.set_bpm(plan.bpm);
        for (sink, start) in self.players.iter().zip(&plan.players) {
            engine.start_player(*sink, start.delay, start.rate);
        }
        log::info!("randomized playback at {:.2} BPM", plan.bpm);
        plan
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Bounds::new(width, height);
        log::debug!("resized to {}x{}", width, height);
    }

    pub fn report(&self) -> FrameReport {
        FrameReport {
            frame: self.frame,
            birds: self.birds.len(),
            boats: self.boats.len(),
            tempo: self.tempo.last_applied(),
            playback_rate: self.tempo.playback_rate(),
            audio_started: self.audio_started,
            tempo_changed: false,
        }
    }

    pub fn settings(&self) -> &SketchSettings {
        &self.settings
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn audio_started(&self) -> bool {
        self.audio_started
    }

    pub fn tempo(&self) -> &TempoController {
        &self.tempo
    }
}
