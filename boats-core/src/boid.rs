use boats_shared::{EdgePolicySetting, FlockSettings};
use rand::Rng;

use crate::behavior;
use crate::render::{DrawCommand, Hue};
use crate::vector::Vector2D;

/// Canvas extent the simulation runs in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// What happens to an agent that leaves the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePolicy {
    /// Toroidal canvas: leaving one edge re-enters from the opposite one
    Wrap,
    /// Clamp inside `margin` and reflect the velocity component
    Contain { margin: f32 },
}

impl From<EdgePolicySetting> for EdgePolicy {
    fn from(setting: EdgePolicySetting) -> Self {
        match setting {
            EdgePolicySetting::Wrap => EdgePolicy::Wrap,
            EdgePolicySetting::Contain { margin } => EdgePolicy::Contain { margin },
        }
    }
}

/// Steering constants shared by every member of a flock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoidConfig {
    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
}

impl BoidConfig {
    /// Wide neighbourhoods of the combined bird and boat sketch
    pub fn talking_boats() -> Self {
        Self {
            separation_distance: 100.0,
            alignment_distance: 100.0,
            cohesion_distance: 50.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
        }
    }

    /// Tight separation of the nine-voice sketch
    pub fn nine_voices() -> Self {
        Self {
            separation_distance: 25.0,
            alignment_distance: 50.0,
            ..Self::talking_boats()
        }
    }
}

impl Default for BoidConfig {
    fn default() -> Self {
        Self::talking_boats()
    }
}

impl From<&FlockSettings> for BoidConfig {
    fn from(settings: &FlockSettings) -> Self {
        Self {
            separation_distance: settings.separation_distance,
            alignment_distance: settings.alignment_distance,
            cohesion_distance: settings.cohesion_distance,
            separation_weight: settings.separation_weight,
            alignment_weight: settings.alignment_weight,
            cohesion_weight: settings.cohesion_weight,
        }
    }
}

/// A single steering agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub position: Vector2D,
    pub velocity: Vector2D,
    /// Force accumulated during the current frame, cleared by `update`
    pub acceleration: Vector2D,
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,
    pub hue: Hue,
    /// Extra weight this agent carries in every other agent's cohesion sum,
    /// regardless of distance. Zero for everything except legacy boats.
    pub cohesion_bias: f32,
}

impl Boid {
    pub fn new(position: Vector2D, velocity: Vector2D) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector2D::zero(),
            max_speed: 3.0,
            max_force: 0.05,
            size: 3.0,
            hue: Hue::default(),
            cohesion_bias: 0.0,
        }
    }

    pub fn with_limits(mut self, max_speed: f32, max_force: f32) -> Self {
        self.max_speed = max_speed;
        self.max_force = max_force;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_hue(mut self, hue: Hue) -> Self {
        self.hue = hue;
        self
    }

    pub fn with_cohesion_bias(mut self, bias: f32) -> Self {
        self.cohesion_bias = bias;
        self
    }

    /// A bird dropped at `position` with a small random heading and a random hue
    pub fn spawn<R: Rng + ?Sized>(position: Vector2D, settings: &FlockSettings, rng: &mut R) -> Self {
        let velocity = Vector2D::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        Self::new(position, velocity)
            .with_limits(settings.max_speed, settings.max_force)
            .with_size(settings.size)
            .with_hue(Hue::random(rng))
    }

    /// A bird anywhere on the canvas
    pub fn random<R: Rng + ?Sized>(bounds: Bounds, settings: &FlockSettings, rng: &mut R) -> Self {
        let position = Vector2D::new(
            rng.gen_range(0.0..bounds.width.max(f32::EPSILON)),
            rng.gen_range(0.0..bounds.height.max(f32::EPSILON)),
        );
        Self::spawn(position, settings, rng)
    }

    /// One simulated frame: steer against `neighbors`, integrate, then apply
    /// the edge policy. Call at most once per frame.
    pub fn run(&mut self, neighbors: &[Boid], config: &BoidConfig, bounds: Bounds, policy: EdgePolicy) {
        self.flock(neighbors, config);
        self.update();
        self.borders(bounds, policy);
    }

    /// Accumulate the weighted separation, alignment and cohesion forces
    pub fn flock(&mut self, neighbors: &[Boid], config: &BoidConfig) {
        let force = behavior::flock_force(self, neighbors, config);
        self.apply_force(force);
    }

    pub fn apply_force(&mut self, force: Vector2D) {
        self.acceleration += force;
    }

    pub fn update(&mut self) {
        self.velocity += self.acceleration;
        self.velocity = self.velocity.limit(self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vector2D::zero();
    }

    pub fn borders(&mut self, bounds: Bounds, policy: EdgePolicy) {
        match policy {
            EdgePolicy::Wrap => self.wrap_edges(bounds),
            EdgePolicy::Contain { margin } => self.contain_within_bounds(bounds, margin),
        }
    }

    /// Wrap on a torus of period `extent + 2 * size`, so an agent fully
    /// leaves the canvas before reappearing on the other side.
    pub fn wrap_edges(&mut self, bounds: Bounds) {
        self.position.x = wrap_axis(self.position.x, bounds.width, self.size);
        self.position.y = wrap_axis(self.position.y, bounds.height, self.size);
    }

    pub fn contain_within_bounds(&mut self, bounds: Bounds, margin: f32) {
        // Bounce off edges by reversing velocity component
        if self.position.x < margin {
            self.position.x = margin;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x > bounds.width - margin {
            self.position.x = bounds.width - margin;
            self.velocity.x = -self.velocity.x.abs();
        }

        if self.position.y < margin {
            self.position.y = margin;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > bounds.height - margin {
            self.position.y = bounds.height - margin;
            self.velocity.y = -self.velocity.y.abs();
        }
    }

    /// Triangle pointing along the direction of travel
    pub fn draw_command(&self) -> DrawCommand {
        DrawCommand::Triangle {
            position: self.position,
            heading: self.velocity.heading() + core::f32::consts::FRAC_PI_2,
            size: self.size,
            hue: self.hue,
        }
    }
}

fn wrap_axis(value: f32, extent: f32, size: f32) -> f32 {
    if value >= -size && value <= extent + size {
        return value;
    }
    let period = extent + 2.0 * size;
    if period > 0.0 {
        (value + size).rem_euclid(period) - size
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn still(x: f32, y: f32) -> Boid {
        Boid::new(Vector2D::new(x, y), Vector2D::zero())
    }

    #[test]
    fn test_boid_update() {
        let mut boid = Boid::new(Vector2D::zero(), Vector2D::new(1.0, 1.0));
        boid.update();

        assert_eq!(boid.position, Vector2D::new(1.0, 1.0));
        assert_eq!(boid.acceleration, Vector2D::zero());
    }

    #[test]
    fn test_update_respects_max_speed() {
        for force in [0.0, 0.5, 7.0, 1.0e6] {
            let mut boid = Boid::new(Vector2D::zero(), Vector2D::new(2.5, -1.0));
            boid.apply_force(Vector2D::new(force, -force * 0.3));
            boid.update();
            assert!(boid.velocity.magnitude() <= boid.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_wrap_left_edge_keeps_overshoot() {
        let bounds = Bounds::new(100.0, 80.0);
        let mut boid = still(-3.5, 40.0);
        boid.wrap_edges(bounds);
        assert_eq!(boid.position.x, 102.5);
        assert_eq!(boid.position.y, 40.0);
    }

    #[test]
    fn test_wrap_all_edges() {
        let bounds = Bounds::new(100.0, 80.0);

        let mut right = still(103.5, 40.0);
        right.wrap_edges(bounds);
        assert_eq!(right.position.x, -2.5);

        let mut top = still(50.0, -3.5);
        top.wrap_edges(bounds);
        assert_eq!(top.position.y, 82.5);

        let mut bottom = still(50.0, 83.5);
        bottom.wrap_edges(bounds);
        assert_eq!(bottom.position.y, -2.5);
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let bounds = Bounds::new(100.0, 80.0);
        let mut boid = still(-3.5, 250.0);
        boid.wrap_edges(bounds);
        let once = boid.position;
        boid.wrap_edges(bounds);
        assert_eq!(boid.position, once);
        assert!(once.y >= -3.0 && once.y <= 83.0);
    }

    #[test]
    fn test_wrap_leaves_edge_values_alone() {
        let bounds = Bounds::new(100.0, 80.0);
        let mut boid = still(-3.0, 83.0);
        boid.wrap_edges(bounds);
        assert_eq!(boid.position, Vector2D::new(-3.0, 83.0));
    }

    #[test]
    fn test_contain_reflects_velocity() {
        let mut boid = Boid::new(Vector2D::new(-5.0, 50.0), Vector2D::new(-1.0, 0.5));
        boid.borders(Bounds::new(100.0, 100.0), EdgePolicy::Contain { margin: 10.0 });
        assert_eq!(boid.position.x, 10.0);
        assert_eq!(boid.velocity.x, 1.0);
        assert_eq!(boid.velocity.y, 0.5);
    }

    #[test]
    fn test_spawn_uses_settings() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = FlockSettings::talking_boats();
        let boid = Boid::spawn(Vector2D::new(5.0, 6.0), &settings, &mut rng);

        assert_eq!(boid.position, Vector2D::new(5.0, 6.0));
        assert_eq!(boid.max_speed, 3.0);
        assert_eq!(boid.size, 3.0);
        assert!(boid.velocity.x.abs() <= 1.0 && boid.velocity.y.abs() <= 1.0);
        assert!(boid.hue.0 >= 0.0 && boid.hue.0 < 256.0);
    }

    #[test]
    fn test_draw_command_points_along_velocity() {
        let boid = Boid::new(Vector2D::new(1.0, 2.0), Vector2D::new(1.0, 0.0));
        let before = boid;
        match boid.draw_command() {
            DrawCommand::Triangle { heading, position, .. } => {
                assert!(approx_eq!(f32, heading, core::f32::consts::FRAC_PI_2, ulps = 2));
                assert_eq!(position, Vector2D::new(1.0, 2.0));
            }
            other => panic!("unexpected draw command {:?}", other),
        }
        assert_eq!(boid, before);
    }
}
