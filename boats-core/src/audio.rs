//! Boundary to the audio engine. The engine owns every panner and player;
//! the simulation only holds `SinkId` handles and issues parameter writes.

use boats_shared::AudioPosition;

/// Non-owning handle to one voice (player plus panner) inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub usize);

pub trait AudioEngine {
    /// False until the user gesture that unlocks audio playback
    fn is_started(&self) -> bool;

    /// Unlock playback. Must be called from a user gesture handler.
    fn resume(&mut self);

    /// Glide the voice's 3D panner to `target` over `ramp_time` seconds
    fn ramp_panner(&mut self, sink: SinkId, target: AudioPosition, ramp_time: f32);

    /// Stereo pan in `[-1, 1]`
    fn set_stereo_pan(&mut self, sink: SinkId, pan: f32);

    fn set_bpm(&mut self, bpm: f32);

    /// Applied to every player
    fn set_playback_rate(&mut self, rate: f32);

    fn start_player(&mut self, sink: SinkId, delay: f32, rate: f32);
}

/// Engine stand-in for drivers without sound. Never starts.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioEngine for NullAudio {
    fn is_started(&self) -> bool {
        false
    }

    fn resume(&mut self) {}

    fn ramp_panner(&mut self, _sink: SinkId, _target: AudioPosition, _ramp_time: f32) {}

    fn set_stereo_pan(&mut self, _sink: SinkId, _pan: f32) {}

    fn set_bpm(&mut self, _bpm: f32) {}

    fn set_playback_rate(&mut self, _rate: f32) {}

    fn start_player(&mut self, _sink: SinkId, _delay: f32, _rate: f32) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Resume,
    Ramp {
        sink: SinkId,
        target: AudioPosition,
        ramp_time: f32,
    },
    StereoPan {
        sink: SinkId,
        pan: f32,
    },
    Bpm(f32),
    PlaybackRate(f32),
    StartPlayer {
        sink: SinkId,
        delay: f32,
        rate: f32,
    },
}

/// Engine that records every write, for headless runs and tests
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub started: bool,
    pub events: Vec<AudioEvent>,
}

impl RecordingAudio {
    pub fn started() -> Self {
        Self {
            started: true,
            events: Vec::new(),
        }
    }

    pub fn ramps_for(&self, sink: SinkId) -> impl Iterator<Item = AudioPosition> + '_ {
        self.events.iter().filter_map(move |event| match event {
            AudioEvent::Ramp { sink: s, target, .. } if *s == sink => Some(*target),
            _ => None,
        })
    }

    pub fn last_bpm(&self) -> Option<f32> {
        self.events.iter().rev().find_map(|event| match event {
            AudioEvent::Bpm(bpm) => Some(*bpm),
            _ => None,
        })
    }

    pub fn take_events(&mut self) -> Vec<AudioEvent> {
        std::mem::take(&mut self.events)
    }
}

impl AudioEngine for RecordingAudio {
    fn is_started(&self) -> bool {
        self.started
    }

    fn resume(&mut self) {
        self.started = true;
        self.events.push(AudioEvent::Resume);
    }

    fn ramp_panner(&mut self, sink: SinkId, target: AudioPosition, ramp_time: f32) {
        self.events.push(AudioEvent::Ramp {
            sink,
            target,
            ramp_time,
        });
    }

    fn set_stereo_pan(&mut self, sink: SinkId, pan: f32) {
        self.events.push(AudioEvent::StereoPan { sink, pan });
    }

    fn set_bpm(&mut self, bpm: f32) {
        self.events.push(AudioEvent::Bpm(bpm));
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.events.push(AudioEvent::PlaybackRate(rate));
    }

    fn start_player(&mut self, sink: SinkId, delay: f32, rate: f32) {
        self.events.push(AudioEvent::StartPlayer { sink, delay, rate });
    }
}
