use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target position for a spatial panner, in audio-space units around the listener
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AudioPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AudioPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Named sketch variants with their own tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Free bird population plus nine image boats, each steering a 3D panner
    #[default]
    TalkingBoats,
    /// Nine birds, each steering the stereo pan of one voice
    NineVoices,
}

/// How agents behave at the canvas edges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicySetting {
    #[default]
    Wrap,
    Contain { margin: f32 },
}

/// Steering constants and population rules for one flock of birds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlockSettings {
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,
    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    /// Count boats twice in every cohesion sum, as the combined bird and boat sketch did
    pub legacy_boat_cohesion: bool,
    pub max_population: Option<usize>,
    pub erase_radius: f32,
}

impl FlockSettings {
    pub fn talking_boats() -> Self {
        Self {
            max_speed: 3.0,
            max_force: 0.05,
            size: 3.0,
            separation_distance: 100.0,
            alignment_distance: 100.0,
            cohesion_distance: 50.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            legacy_boat_cohesion: false,
            max_population: None,
            erase_radius: 30.0,
        }
    }

    pub fn nine_voices() -> Self {
        Self {
            separation_distance: 25.0,
            alignment_distance: 50.0,
            cohesion_distance: 50.0,
            max_population: Some(9),
            ..Self::talking_boats()
        }
    }

    fn sanitize(&mut self, fallback: &FlockSettings) {
        self.max_speed = clamp_finite(self.max_speed, 0.0, 100.0, fallback.max_speed);
        self.max_force = clamp_finite(self.max_force, 0.0, 10.0, fallback.max_force);
        self.size = clamp_finite(self.size, 0.0, 500.0, fallback.size);
        self.separation_distance = clamp_finite(
            self.separation_distance,
            0.0,
            10_000.0,
            fallback.separation_distance,
        );
        self.alignment_distance = clamp_finite(
            self.alignment_distance,
            0.0,
            10_000.0,
            fallback.alignment_distance,
        );
        self.cohesion_distance = clamp_finite(
            self.cohesion_distance,
            0.0,
            10_000.0,
            fallback.cohesion_distance,
        );
        self.separation_weight =
            clamp_finite(self.separation_weight, 0.0, 10.0, fallback.separation_weight);
        self.alignment_weight =
            clamp_finite(self.alignment_weight, 0.0, 10.0, fallback.alignment_weight);
        self.cohesion_weight =
            clamp_finite(self.cohesion_weight, 0.0, 10.0, fallback.cohesion_weight);
        self.erase_radius = clamp_finite(self.erase_radius, 0.0, 10_000.0, fallback.erase_radius);
    }
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self::talking_boats()
    }
}

/// Tuning for boats: the steering part plus the audio orbit they drive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoatSettings {
    pub max_speed: f32,
    pub max_force: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub audio_radius: f32,
    /// Orbit advance in radians per frame
    pub audio_speed: f32,
    /// Canvas y is mapped onto `-audio_y_range..audio_y_range`
    pub audio_y_range: f32,
    /// Seconds the panner takes to glide to each new target
    pub ramp_time: f32,
}

impl Default for BoatSettings {
    fn default() -> Self {
        Self {
            max_speed: 1.0,
            max_force: 0.05,
            min_size: 80.0,
            max_size: 120.0,
            audio_radius: 5.0,
            audio_speed: 0.02,
            audio_y_range: 5.0,
            ramp_time: 0.1,
        }
    }
}

impl BoatSettings {
    fn sanitize(&mut self, fallback: &BoatSettings) {
        self.max_speed = clamp_finite(self.max_speed, 0.0, 100.0, fallback.max_speed);
        self.max_force = clamp_finite(self.max_force, 0.0, 10.0, fallback.max_force);
        self.min_size = clamp_finite(self.min_size, 1.0, 1_000.0, fallback.min_size);
        self.max_size = clamp_finite(self.max_size, 1.0, 1_000.0, fallback.max_size);
        if self.max_size <= self.min_size {
            self.max_size = self.min_size + 1.0;
        }
        self.audio_radius = clamp_finite(self.audio_radius, 0.0, 100.0, fallback.audio_radius);
        self.audio_speed = clamp_finite(self.audio_speed, 0.0, 1.0, fallback.audio_speed);
        self.audio_y_range = clamp_finite(self.audio_y_range, 0.0, 100.0, fallback.audio_y_range);
        self.ramp_time = clamp_finite(self.ramp_time, 0.0, 10.0, fallback.ramp_time);
    }
}

/// Frame rate to transport tempo mapping and the randomize button's ranges
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TempoSettings {
    pub min_fps: f32,
    pub max_fps: f32,
    pub min_tempo: f32,
    pub max_tempo: f32,
    /// Tempo the stems were recorded at; playback rate is `tempo / base_tempo`
    pub base_tempo: f32,
    pub initial_tempo: f32,
    /// Randomized tempo is drawn from `last * (1 - spread)..last * (1 + spread)`
    pub randomize_spread: f32,
    pub min_rate: f32,
    pub max_rate: f32,
    /// Longest random start delay in seconds
    pub max_offset: f32,
}

impl Default for TempoSettings {
    fn default() -> Self {
        Self {
            min_fps: 15.0,
            max_fps: 60.0,
            min_tempo: 40.0,
            max_tempo: 120.0,
            base_tempo: 44.0,
            initial_tempo: 44.0,
            randomize_spread: 0.2,
            min_rate: 0.02,
            max_rate: 0.8,
            max_offset: 0.0,
        }
    }
}

impl TempoSettings {
    fn sanitize(&mut self, fallback: &TempoSettings) {
        self.min_fps = clamp_finite(self.min_fps, 1.0, 240.0, fallback.min_fps);
        self.max_fps = clamp_finite(self.max_fps, 1.0, 240.0, fallback.max_fps);
        if self.max_fps <= self.min_fps {
            self.min_fps = fallback.min_fps;
            self.max_fps = fallback.max_fps;
        }
        self.min_tempo = clamp_finite(self.min_tempo, 1.0, 400.0, fallback.min_tempo);
        self.max_tempo = clamp_finite(self.max_tempo, 1.0, 400.0, fallback.max_tempo);
        if self.max_tempo < self.min_tempo {
            self.min_tempo = fallback.min_tempo;
            self.max_tempo = fallback.max_tempo;
        }
        self.base_tempo = clamp_finite(self.base_tempo, 1.0, 400.0, fallback.base_tempo);
        self.initial_tempo = clamp_finite(self.initial_tempo, 1.0, 400.0, fallback.initial_tempo);
        self.randomize_spread =
            clamp_finite(self.randomize_spread, 0.0, 0.95, fallback.randomize_spread);
        self.min_rate = clamp_finite(self.min_rate, 0.01, 4.0, fallback.min_rate);
        self.max_rate = clamp_finite(self.max_rate, 0.01, 4.0, fallback.max_rate);
        if self.max_rate <= self.min_rate {
            self.min_rate = fallback.min_rate;
            self.max_rate = fallback.max_rate;
        }
        self.max_offset = clamp_finite(self.max_offset, 0.0, 60.0, fallback.max_offset);
    }
}

/// Complete configuration of one sketch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SketchSettings {
    pub preset: Preset,
    pub birds: FlockSettings,
    pub boats: BoatSettings,
    pub tempo: TempoSettings,
    pub edge_policy: EdgePolicySetting,
    pub initial_birds: usize,
    pub boat_count: usize,
    /// Number of stereo voices panned by the first birds' x position
    pub stereo_channels: usize,
}

impl SketchSettings {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::TalkingBoats => Self {
                preset,
                birds: FlockSettings::talking_boats(),
                boats: BoatSettings::default(),
                tempo: TempoSettings::default(),
                edge_policy: EdgePolicySetting::Wrap,
                initial_birds: 0,
                boat_count: 9,
                stereo_channels: 0,
            },
            Preset::NineVoices => Self {
                preset,
                birds: FlockSettings::nine_voices(),
                boats: BoatSettings::default(),
                tempo: TempoSettings::default(),
                edge_policy: EdgePolicySetting::Wrap,
                initial_birds: 9,
                boat_count: 0,
                stereo_channels: 9,
            },
        }
    }

    /// Parse settings from JSON. Fields that are missing fall back to the
    /// defaults of the preset named in the document (talking boats if absent).
    /// The result is sanitized.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        let preset = match overrides.get("preset") {
            Some(value) => Preset::deserialize(value)?,
            None => Preset::default(),
        };

        let mut merged = serde_json::to_value(Self::preset(preset))?;
        merge_json(&mut merged, overrides);

        let mut settings: Self = serde_json::from_value(merged)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Clamp every numeric field into a finite working range, restoring the
    /// preset default where a value is NaN or infinite.
    pub fn sanitize(&mut self) {
        let fallback = Self::preset(self.preset);
        self.birds.sanitize(&fallback.birds);
        self.boats.sanitize(&fallback.boats);
        self.tempo.sanitize(&fallback.tempo);
        if let EdgePolicySetting::Contain { margin } = &mut self.edge_policy {
            *margin = clamp_finite(*margin, 0.0, 1_000.0, 10.0);
        }
        if let Some(cap) = self.birds.max_population {
            self.initial_birds = self.initial_birds.min(cap);
        }
    }
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Per-frame status emitted by a sketch driver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub birds: usize,
    pub boats: usize,
    pub tempo: f32,
    pub playback_rate: f32,
    pub audio_started: bool,
    /// True on the frame where a new tempo was pushed to the audio engine
    pub tempo_changed: bool,
}
