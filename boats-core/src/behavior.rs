//! Steering behaviours. Every neighbour scan skips entries at distance zero,
//! which covers the agent itself as well as exact overlaps.

use crate::boid::{Boid, BoidConfig};
use crate::vector::Vector2D;

/// Weighted sum of separation, alignment and cohesion for `boid`
pub fn flock_force(boid: &Boid, neighbors: &[Boid], config: &BoidConfig) -> Vector2D {
    let sep = separation(boid, neighbors.iter(), config) * config.separation_weight;
    let ali = alignment(boid, neighbors.iter(), config) * config.alignment_weight;
    let coh = cohesion(boid, neighbors.iter(), config) * config.cohesion_weight;
    sep + ali + coh
}

pub fn separation<'a, I>(boid: &Boid, others: I, config: &BoidConfig) -> Vector2D
where
    I: Iterator<Item = &'a Boid>,
{
    let mut steering = Vector2D::zero();
    let mut count = 0;

    for other in others {
        let distance = boid.position.distance(&other.position);
        if distance > 0.0 && distance < config.separation_distance {
            // Closer neighbours push harder
            let diff = (boid.position - other.position).normalize() / distance;
            steering += diff;
            count += 1;
        }
    }

    if count > 0 {
        steering = steering / count as f32;
    }

    if steering.magnitude() > 0.0 {
        steering = steering.set_magnitude(boid.max_speed);
        steering = steering - boid.velocity;
        steering = steering.limit(boid.max_force);
    }

    steering
}

pub fn alignment<'a, I>(boid: &Boid, others: I, config: &BoidConfig) -> Vector2D
where
    I: Iterator<Item = &'a Boid>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in others {
        let distance = boid.position.distance(&other.position);
        if distance > 0.0 && distance < config.alignment_distance {
            sum += other.velocity;
            count += 1;
        }
    }

    if count > 0 {
        sum = sum / count as f32;
        sum = sum.set_magnitude(boid.max_speed);
        let steering = sum - boid.velocity;
        steering.limit(boid.max_force)
    } else {
        Vector2D::zero()
    }
}

pub fn cohesion<'a, I>(boid: &Boid, others: I, config: &BoidConfig) -> Vector2D
where
    I: Iterator<Item = &'a Boid>,
{
    let mut sum = Vector2D::zero();
    let mut count = 0.0;

    for other in others {
        let distance = boid.position.distance(&other.position);
        if distance > 0.0 && distance < config.cohesion_distance {
            sum += other.position;
            count += 1.0;
        }
        if other.cohesion_bias > 0.0 {
            sum += other.position * other.cohesion_bias;
            count += other.cohesion_bias;
        }
    }

    if count > 0.0 {
        sum = sum / count;
        seek(boid, sum, config)
    } else {
        Vector2D::zero()
    }
}

pub fn seek(boid: &Boid, target: Vector2D, _config: &BoidConfig) -> Vector2D {
    let desired = (target - boid.position).set_magnitude(boid.max_speed);
    let steering = desired - boid.velocity;
    steering.limit(boid.max_force)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn boid_at(x: f32, y: f32) -> Boid {
        Boid::new(Vector2D::new(x, y), Vector2D::zero())
    }

    fn moving(x: f32, y: f32, vx: f32, vy: f32) -> Boid {
        Boid::new(Vector2D::new(x, y), Vector2D::new(vx, vy))
    }

    #[test]
    fn test_self_only_neighbourhood_is_inert() {
        let config = BoidConfig::default();
        let boid = moving(10.0, 10.0, 1.0, 0.5);
        let neighbors = [boid];

        assert_eq!(separation(&boid, neighbors.iter(), &config), Vector2D::zero());
        assert_eq!(alignment(&boid, neighbors.iter(), &config), Vector2D::zero());
        assert_eq!(cohesion(&boid, neighbors.iter(), &config), Vector2D::zero());
        assert_eq!(flock_force(&boid, &neighbors, &config), Vector2D::zero());
    }

    #[test]
    fn test_overlapping_agents_are_skipped() {
        let config = BoidConfig::default();
        let boid = moving(10.0, 10.0, 1.0, 0.0);
        let twin = moving(10.0, 10.0, -1.0, 0.0);

        let force = flock_force(&boid, &[boid, twin], &config);
        assert!(force.is_finite());
        assert_eq!(force, Vector2D::zero());
    }

    #[test]
    fn test_separation_pushes_away() {
        let config = BoidConfig::default();
        let boid = boid_at(0.0, 0.0);
        let neighbors = [boid, boid_at(5.0, 0.0)];

        let steer = separation(&boid, neighbors.iter(), &config);
        assert!(steer.x < 0.0);
        assert!(steer.magnitude() <= boid.max_force + 1e-6);
    }

    #[test]
    fn test_separation_ignores_far_neighbours() {
        let config = BoidConfig::nine_voices();
        let boid = boid_at(0.0, 0.0);
        let neighbors = [boid_at(30.0, 0.0)];
        assert_eq!(separation(&boid, neighbors.iter(), &config), Vector2D::zero());
    }

    #[test]
    fn test_alignment_follows_neighbour_heading() {
        let config = BoidConfig::default();
        let boid = moving(0.0, 0.0, 0.0, 1.0);
        let neighbors = [boid, moving(10.0, 0.0, 2.0, 0.0), moving(0.0, 10.0, 2.0, 0.0)];

        let steer = alignment(&boid, neighbors.iter(), &config);
        assert!(steer.x > 0.0);
        assert!(steer.y < 0.0);
        assert!(approx_eq!(f32, steer.magnitude(), boid.max_force, epsilon = 1e-6));
    }

    #[test]
    fn test_cohesion_steers_towards_centre() {
        let config = BoidConfig {
            cohesion_distance: 50.0,
            ..BoidConfig::default()
        };
        let boid = boid_at(20.0, 0.0);
        let neighbors = [boid_at(0.0, 0.0), boid_at(10.0, 0.0), boid];

        let steer = cohesion(&boid, neighbors.iter(), &config);
        assert!(steer.x < 0.0);
        assert!(approx_eq!(f32, steer.y, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, steer.magnitude(), boid.max_force, epsilon = 1e-6));
    }

    #[test]
    fn test_cohesion_bias_counts_out_of_range_agents() {
        let config = BoidConfig::default();
        let boid = boid_at(0.0, 0.0);
        let far_boat = boid_at(500.0, 0.0).with_cohesion_bias(1.0);

        let plain = cohesion(&boid, [boid_at(500.0, 0.0)].iter(), &config);
        assert_eq!(plain, Vector2D::zero());

        let biased = cohesion(&boid, [far_boat].iter(), &config);
        assert!(biased.x > 0.0);
    }

    #[test]
    fn test_seek_is_bounded() {
        let config = BoidConfig::default();
        let boid = moving(0.0, 0.0, -3.0, 0.0);
        let steer = seek(&boid, Vector2D::new(1000.0, 0.0), &config);

        assert!(steer.x > 0.0);
        assert!(steer.magnitude() <= boid.max_force + 1e-6);
    }

    #[test]
    fn test_forces_bounded_in_dense_crowd() {
        let config = BoidConfig::default();
        let crowd: Vec<Boid> = (0..25)
            .map(|i| {
                let f = i as f32;
                moving(f * 1.7 % 13.0, f * 2.3 % 11.0, (f * 0.37).sin(), (f * 0.91).cos())
            })
            .collect();

        for boid in &crowd {
            assert!(separation(boid, crowd.iter(), &config).magnitude() <= boid.max_force + 1e-6);
            assert!(alignment(boid, crowd.iter(), &config).magnitude() <= boid.max_force + 1e-6);
            assert!(cohesion(boid, crowd.iter(), &config).magnitude() <= boid.max_force + 1e-6);
        }
    }
}
