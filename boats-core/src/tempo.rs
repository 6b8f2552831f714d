//! Frame rate to tempo mapping for the looping stems.
//!
//! The driver reports its measured frame rate every tick. Whenever the bird
//! population changes, the next tick with audio running derives a new
//! transport tempo from that frame rate and speeds every stem up or down by
//! `tempo / base_tempo`.

use boats_shared::TempoSettings;
use rand::Rng;

/// Linear re-mapping of `value` from `from_lo..from_hi` onto `to_lo..to_hi`.
/// Not clamped. A degenerate source range maps to the middle of the target.
pub fn map_range(value: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> f32 {
    let span = from_hi - from_lo;
    if span == 0.0 {
        return (to_lo + to_hi) / 2.0;
    }
    to_lo + (value - from_lo) / span * (to_hi - to_lo)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoUpdate {
    pub bpm: f32,
    pub playback_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStart {
    /// Seconds before the player starts
    pub delay: f32,
    pub rate: f32,
}

/// Outcome of the randomize button: a new transport tempo and a staggered,
/// individually detuned start for every player
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizePlan {
    pub bpm: f32,
    pub players: Vec<PlayerStart>,
}

#[derive(Debug, Clone)]
pub struct TempoController {
    settings: TempoSettings,
    last_applied: f32,
    previous_population: usize,
    update_needed: bool,
}

impl TempoController {
    pub fn new(settings: TempoSettings) -> Self {
        Self {
            last_applied: settings.initial_tempo,
            settings,
            previous_population: 0,
            update_needed: false,
        }
    }

    /// Take `population` as the current count without requesting an update
    pub fn sync_population(&mut self, population: usize) {
        self.previous_population = population;
    }

    pub fn settings(&self) -> &TempoSettings {
        &self.settings
    }

    pub fn last_applied(&self) -> f32 {
        self.last_applied
    }

    pub fn playback_rate(&self) -> f32 {
        self.last_applied / self.settings.base_tempo
    }

    pub fn update_needed(&self) -> bool {
        self.update_needed
    }

    /// Request a tempo refresh on the next observed frame
    pub fn mark_dirty(&mut self) {
        self.update_needed = true;
    }

    /// Tempo for a measured frame rate, clamped to the tempo range
    pub fn tempo_for_fps(&self, fps: f32) -> f32 {
        let s = &self.settings;
        let fps = if fps.is_finite() { fps } else { s.max_fps };
        map_range(fps, s.min_fps, s.max_fps, s.min_tempo, s.max_tempo).clamp(s.min_tempo, s.max_tempo)
    }

    pub fn observe(&mut self, fps: f32, population: usize, audio_started: bool) -> Option<TempoUpdate> {
        if population != self.previous_population {
            self.update_needed = true;
            self.previous_population = population;
        }

        if !(self.update_needed && audio_started) {
            return None;
        }

        self.last_applied = self.tempo_for_fps(fps);
        self.update_needed = false;
        log::debug!(
            "tempo {:.2} BPM for {:.1} fps, playback rate {:.3}",
            self.last_applied,
            fps,
            self.playback_rate()
        );

        Some(TempoUpdate {
            bpm: self.last_applied,
            playback_rate: self.playback_rate(),
        })
    }

    /// Draw a random tempo around the last applied one plus a random delay
    /// and rate for each of `player_count` players
    pub fn randomize<R: Rng + ?Sized>(&self, rng: &mut R, player_count: usize) -> RandomizePlan {
        let s = &self.settings;
        let bpm = uniform(
            rng,
            self.last_applied * (1.0 - s.randomize_spread),
            self.last_applied * (1.0 + s.randomize_spread),
        );
        let players = (0..player_count)
            .map(|_| PlayerStart {
                delay: uniform(rng, 0.0, s.max_offset),
                rate: uniform(rng, s.min_rate, s.max_rate),
            })
            .collect();

        RandomizePlan { bpm, players }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Frame rate from successive display-refresh timestamps
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    last_timestamp: Option<f64>,
    fps: f32,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self {
            last_timestamp: None,
            fps: 60.0,
        }
    }
}

impl FrameRateMeter {
    /// Record a frame at `timestamp_ms` and return the current estimate.
    /// Timestamps that do not move forward are ignored.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        match self.last_timestamp {
            Some(last) if timestamp_ms > last => {
                self.fps = (1000.0 / (timestamp_ms - last)) as f32;
                self.last_timestamp = Some(timestamp_ms);
            }
            Some(_) => {}
            None => self.last_timestamp = Some(timestamp_ms),
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}
