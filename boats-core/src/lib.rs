//! Flocking simulation behind the talking boats sketches.
//!
//! Birds and boats steer as one neighbourhood. Boats additionally carry an
//! audio binding that moves a voice's 3D panner on its own orbit, and the
//! bird population drives the transport tempo. Rendering and sound are
//! reached through the `Renderer` and `AudioEngine` traits so the same
//! simulation runs in the browser and headless.

pub mod audio;
pub mod behavior;
pub mod boat;
pub mod boid;
pub mod flock;
pub mod input;
pub mod render;
pub mod sketch;
pub mod tempo;
pub mod vector;

pub use audio::{AudioEngine, AudioEvent, NullAudio, RecordingAudio, SinkId};
pub use boat::{spawn_boat, update_audio_positions, update_stereo_pans, AudioBinding, Sprite};
pub use boid::{Boid, BoidConfig, Bounds, EdgePolicy};
pub use flock::{Agent, Applied, Flock, FlockCommand};
pub use input::{GestureTracker, MouseButton, PointerEvent};
pub use render::{DrawCommand, DrawList, Hue, ImageId, Renderer};
pub use sketch::Sketch;
pub use tempo::{map_range, FrameRateMeter, PlayerStart, RandomizePlan, TempoController, TempoUpdate};
pub use vector::Vector2D;

pub use boats_shared::{AudioPosition, FrameReport, Preset, SketchSettings};
