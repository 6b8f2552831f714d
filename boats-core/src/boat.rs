//! Boats: boids with an attached audio binding and a sprite.
//!
//! A boat's visual motion comes from flocking. Its panner moves on a separate
//! slow orbit driven only by the binding's angle and the boat's canvas y, so
//! the sound keeps circling the listener even while the boat idles.

use boats_shared::{AudioPosition, BoatSettings};
use rand::Rng;

use crate::audio::{AudioEngine, SinkId};
use crate::boid::{Bounds, Boid};
use crate::flock::{Agent, Flock};
use crate::render::{Hue, ImageId};
use crate::tempo::map_range;
use crate::vector::Vector2D;

const TWO_PI: f32 = core::f32::consts::TAU;

/// Image drawn in place of the triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub image: ImageId,
    pub flipped: bool,
}

/// Orbit state for one voice's panner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioBinding {
    /// `None` until the engine hands out a voice for this agent
    pub sink: Option<SinkId>,
    pub angle: f32,
    pub audio_radius: f32,
    pub audio_speed: f32,
    pub y_range: f32,
    pub ramp_time: f32,
}

impl AudioBinding {
    pub fn new(sink: Option<SinkId>, settings: &BoatSettings) -> Self {
        Self {
            sink,
            angle: 0.0,
            audio_radius: settings.audio_radius,
            audio_speed: settings.audio_speed,
            y_range: settings.audio_y_range,
            ramp_time: settings.ramp_time,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Step the orbit one frame and return the panner target for a boat at
    /// canvas height `y`
    pub fn advance(&mut self, y: f32, height: f32) -> AudioPosition {
        self.angle += self.audio_speed;
        if self.angle > TWO_PI {
            self.angle -= TWO_PI;
        }

        AudioPosition::new(
            self.audio_radius * self.angle.cos(),
            map_range(y, 0.0, height, -self.y_range, self.y_range),
            self.audio_radius * self.angle.sin(),
        )
    }
}

/// A boat at a random spot on the canvas, bound to `sink` and drawn with `image`
pub fn spawn_boat<R: Rng + ?Sized>(
    bounds: Bounds,
    settings: &BoatSettings,
    sink: Option<SinkId>,
    image: Option<ImageId>,
    cohesion_bias: f32,
    rng: &mut R,
) -> Agent {
    let position = Vector2D::new(
        rng.gen_range(0.0..bounds.width.max(f32::EPSILON)),
        rng.gen_range(0.0..bounds.height.max(f32::EPSILON)),
    );
    let velocity = Vector2D::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
    let size = if settings.max_size > settings.min_size {
        rng.gen_range(settings.min_size..settings.max_size)
    } else {
        settings.min_size
    };

    let boid = Boid::new(position, velocity)
        .with_limits(settings.max_speed, settings.max_force)
        .with_size(size)
        .with_hue(Hue::random(rng))
        .with_cohesion_bias(cohesion_bias);

    let sprite = image.map(|image| Sprite {
        image,
        flipped: rng.gen_bool(0.5),
    });
    let binding = AudioBinding::new(sink, settings).with_angle(rng.gen_range(0.0..TWO_PI));

    Agent {
        boid,
        binding: Some(binding),
        sprite,
    }
}

/// Advance every bound agent's orbit and ramp its panner. Runs after the
/// steering pass each frame. Orbits advance even while the engine is locked
/// so the sound does not jump when it starts; writes only happen once it runs.
pub fn update_audio_positions(flock: &mut Flock, bounds: Bounds, engine: &mut dyn AudioEngine) {
    let live = engine.is_started();
    for agent in flock.agents.iter_mut() {
        let Some(binding) = agent.binding.as_mut() else {
            continue;
        };
        let target = binding.advance(agent.boid.position.y, bounds.height);
        if let Some(sink) = binding.sink.filter(|_| live) {
            engine.ramp_panner(sink, target, binding.ramp_time);
        }
    }
}

/// Pan voice `i` by the x position of bird `i`, for as many pairs as exist
pub fn update_stereo_pans(birds: &Flock, channels: &[SinkId], width: f32, engine: &mut dyn AudioEngine) {
    if !engine.is_started() {
        return;
    }
    for (agent, sink) in birds.agents.iter().zip(channels) {
        let pan = map_range(agent.boid.position.x, 0.0, width, -1.0, 1.0).clamp(-1.0, 1.0);
        engine.set_stereo_pan(*sink, pan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioEvent, NullAudio, RecordingAudio};
    use crate::boid::{BoidConfig, EdgePolicy};
    use float_cmp::approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn orbit_settings() -> BoatSettings {
        BoatSettings {
            audio_radius: 5.0,
            audio_speed: 0.02,
            ..BoatSettings::default()
        }
    }

    fn parked_boat(sink: Option<SinkId>, x: f32, y: f32) -> Agent {
        Agent {
            boid: Boid::new(Vector2D::new(x, y), Vector2D::zero()).with_limits(1.0, 0.05),
            binding: Some(AudioBinding::new(sink, &orbit_settings())),
            sprite: None,
        }
    }

    #[test]
    fn test_advance_one_frame() {
        let mut binding = AudioBinding::new(Some(SinkId(0)), &orbit_settings());
        let target = binding.advance(200.0, 400.0);

        assert!(approx_eq!(f32, binding.angle, 0.02, ulps = 2));
        assert!(approx_eq!(f32, target.x, 5.0 * 0.02f32.cos(), epsilon = 1e-6));
        assert!(approx_eq!(f32, target.z, 5.0 * 0.02f32.sin(), epsilon = 1e-6));
        assert!(approx_eq!(f32, target.y, 0.0, epsilon = 1e-6));
    }

    #[test]
    fn test_advance_maps_y_onto_audio_range() {
        let mut binding = AudioBinding::new(None, &orbit_settings());
        assert_eq!(binding.advance(0.0, 400.0).y, -5.0);
        assert_eq!(binding.advance(400.0, 400.0).y, 5.0);
    }

    #[test]
    fn test_advance_wraps_angle() {
        let mut binding = AudioBinding::new(None, &orbit_settings()).with_angle(TWO_PI - 0.01);
        binding.advance(0.0, 1.0);
        assert!(binding.angle >= 0.0 && binding.angle < 0.02);
    }

    #[test]
    fn test_orbit_ignores_visual_position() {
        let bounds = Bounds::new(400.0, 400.0);
        let mut flock = Flock::new(BoidConfig::default(), EdgePolicy::Wrap);
        flock.add_agent(parked_boat(Some(SinkId(0)), 10.0, 200.0)).unwrap();
        flock.add_agent(parked_boat(Some(SinkId(1)), 390.0, 200.0)).unwrap();

        let mut engine = RecordingAudio::started();
        update_audio_positions(&mut flock, bounds, &mut engine);

        let a: Vec<_> = engine.ramps_for(SinkId(0)).collect();
        let b: Vec<_> = engine.ramps_for(SinkId(1)).collect();
        assert_eq!(a, b);
        assert!(approx_eq!(f32, a[0].x, 5.0 * 0.02f32.cos(), epsilon = 1e-6));
    }

    #[test]
    fn test_frozen_boat_keeps_moving_in_audio_space() {
        let bounds = Bounds::new(400.0, 400.0);
        let mut flock = Flock::new(BoidConfig::default(), EdgePolicy::Wrap);
        flock.add_agent(parked_boat(Some(SinkId(4)), 100.0, 100.0)).unwrap();

        let mut engine = RecordingAudio::started();
        let mut last_angle = 0.0;
        for _ in 0..100 {
            flock.agents[0].boid.velocity = Vector2D::zero();
            update_audio_positions(&mut flock, bounds, &mut engine);
            let angle = flock.agents[0].binding.unwrap().angle;
            assert!(angle > last_angle);
            last_angle = angle;
        }

        let ramps: Vec<_> = engine.ramps_for(SinkId(4)).collect();
        assert_eq!(ramps.len(), 100);
        assert!(ramps.windows(2).all(|pair| pair[0] != pair[1]));
        assert_eq!(flock.agents[0].boid.position, Vector2D::new(100.0, 100.0));
    }

    #[test]
    fn test_unbound_or_locked_is_a_no_op() {
        let bounds = Bounds::new(400.0, 400.0);
        let mut flock = Flock::new(BoidConfig::default(), EdgePolicy::Wrap);
        flock.add_agent(parked_boat(None, 10.0, 10.0)).unwrap();
        flock.add_agent(parked_boat(Some(SinkId(1)), 10.0, 10.0)).unwrap();

        let mut locked = RecordingAudio::default();
        update_audio_positions(&mut flock, bounds, &mut locked);
        assert!(locked.events.is_empty());

        let mut live = RecordingAudio::started();
        update_audio_positions(&mut flock, bounds, &mut live);
        assert_eq!(live.events.len(), 1);

        update_audio_positions(&mut flock, bounds, &mut NullAudio);
        assert!(approx_eq!(f32, flock.agents[0].binding.unwrap().angle, 0.06, epsilon = 1e-6));
    }

    #[test]
    fn test_stereo_pans_follow_x() {
        let mut birds = Flock::new(BoidConfig::nine_voices(), EdgePolicy::Wrap);
        for x in [0.0, 320.0, 640.0, 900.0] {
            birds.add_boid(Boid::new(Vector2D::new(x, 10.0), Vector2D::zero())).unwrap();
        }
        let channels = [SinkId(0), SinkId(1), SinkId(2)];
        let mut engine = RecordingAudio::started();
        update_stereo_pans(&birds, &channels, 640.0, &mut engine);

        assert_eq!(
            engine.events,
            vec![
                AudioEvent::StereoPan { sink: SinkId(0), pan: -1.0 },
                AudioEvent::StereoPan { sink: SinkId(1), pan: 0.0 },
                AudioEvent::StereoPan { sink: SinkId(2), pan: 1.0 },
            ]
        );
    }

    #[test]
    fn test_spawn_boat_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let settings = BoatSettings::default();
        let boat = spawn_boat(
            Bounds::new(800.0, 600.0),
            &settings,
            Some(SinkId(2)),
            Some(ImageId(5)),
            0.0,
            &mut rng,
        );

        assert!(boat.boid.size >= 80.0 && boat.boid.size < 120.0);
        assert_eq!(boat.boid.max_speed, 1.0);
        assert_eq!(boat.sprite.map(|s| s.image), Some(ImageId(5)));
        let binding = boat.binding.unwrap();
        assert_eq!(binding.sink, Some(SinkId(2)));
        assert!(binding.angle >= 0.0 && binding.angle < TWO_PI);
    }
}
