//! Per-frame motion of the swarm.
//!
//! The force model is not gravity. A tangential push keeps particles circling,
//! a radial pull that strengthens with age drags them inward, and a flat drag
//! keeps velocity bounded. Velocity is stored as a per-frame displacement, so
//! `dt` scales the forces but not the final position step.

use cgmath::prelude::*;
use cgmath::{Vector3, vec3};
use rayon::prelude::*;

use crate::config::DynamicsConfig;
use crate::pool::ParticlePool;

#[derive(Clone, Debug)]
pub struct Integrator {
    dynamics: DynamicsConfig,
}

impl Integrator {
    pub fn new(dynamics: DynamicsConfig) -> Self {
        Self { dynamics }
    }

    /// Orbital speed for a planar radius. Strictly decreasing in `planar_radius`.
    pub fn orbital_speed(&self, planar_radius: f32) -> f32 {
        self.dynamics.orbital_gain / (planar_radius.max(0.0) + 1.0).sqrt()
    }

    /// Magnitude of the inward pull.
    ///
    /// The coefficient `k0 + age * k1` has no ceiling, so every particle is
    /// eventually consumed no matter where it started.
    pub fn pull(&self, r: f32, age: f32, initial_radius: f32) -> f32 {
        let d = &self.dynamics;
        let k = d.pull_base + age * d.pull_growth;
        let depth = (1.0 - r / initial_radius.max(d.epsilon)).max(0.0);
        k / (r + d.epsilon) * (1.0 + d.origin_bias * depth)
    }

    /// Advances one slot by `dt` seconds.
    pub fn advance(
        &self,
        position: &mut [f32],
        velocity: &mut [f32],
        age: &mut f32,
        initial_radius: f32,
        dt: f32,
    ) {
        let d = &self.dynamics;
        *age += dt;

        let p = vec3(position[0], position[1], position[2]);
        let mut v = vec3(velocity[0], velocity[1], velocity[2]);

        let planar = (p.x * p.x + p.z * p.z).sqrt();
        let r = p.magnitude();

        // (x, z) rotated a quarter turn about +y
        let tangent = vec3(-p.z, 0.0, p.x) / (planar + d.epsilon);
        let inward: Vector3<f32> = p / (r + d.epsilon);

        v += tangent * (self.orbital_speed(planar) * dt);
        v -= inward * (self.pull(r, *age, initial_radius) * dt * d.pull_amplification);
        v.y -= p.y * d.vertical_damping * dt;
        v *= d.drag;

        let p = p + v;
        position.copy_from_slice(&[p.x, p.y, p.z]);
        velocity.copy_from_slice(&[v.x, v.y, v.z]);
    }

    /// Advances every active slot.
    pub fn step(&self, pool: &mut ParticlePool, dt: f32) {
        let ParticlePool {
            positions,
            velocities,
            ages,
            initial_radii,
            active,
            ..
        } = pool;

        positions
            .par_chunks_exact_mut(3)
            .zip(velocities.par_chunks_exact_mut(3))
            .zip(ages.par_iter_mut())
            .zip(initial_radii.par_iter())
            .zip(active.par_iter())
            .filter(|(_, active)| **active)
            .for_each(|((((position, velocity), age), &initial_radius), _)| {
                self.advance(position, velocity, age, initial_radius, dt);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator() -> Integrator {
        Integrator::new(DynamicsConfig::default())
    }

    #[test]
    fn test_orbital_speed_decreases_with_radius() {
        let integrator = integrator();
        let mut previous = f32::INFINITY;
        for i in 0..200 {
            let speed = integrator.orbital_speed(i as f32 * 0.1);
            assert!(speed < previous);
            previous = speed;
        }
    }

    #[test]
    fn test_pull_grows_with_age() {
        let integrator = integrator();
        let young = integrator.pull(8.0, 0.0, 12.0);
        let old = integrator.pull(8.0, 30.0, 12.0);
        assert!(old > young);
        assert!(integrator.pull(8.0, 1000.0, 12.0) > 10.0 * young);
    }

    #[test]
    fn test_pull_biased_below_spawn_radius() {
        let integrator = integrator();
        let at_spawn = integrator.pull(8.0, 1.0, 8.0);
        let fallen = integrator.pull(8.0, 1.0, 14.0);
        assert!(fallen > at_spawn);
    }

    #[test]
    fn test_advance_ages_and_moves_inward() {
        let integrator = integrator();
        let mut position = [12.0, 0.0, 0.0];
        let mut velocity = [0.0, 0.0, 0.0];
        let mut age = 0.0;

        integrator.advance(&mut position, &mut velocity, &mut age, 12.0, 1.0 / 60.0);

        assert!((age - 1.0 / 60.0).abs() < 1e-7);
        // Pulled toward the origin and pushed along +z
        assert!(position[0] < 12.0);
        assert!(position[2] > 0.0);
    }

    #[test]
    fn test_advance_flattens_toward_plane() {
        let integrator = integrator();
        let mut position = [12.0, 1.0, 0.0];
        let mut velocity = [0.0; 3];
        let mut age = 0.0;
        for _ in 0..30 {
            integrator.advance(&mut position, &mut velocity, &mut age, 12.0, 1.0 / 60.0);
        }
        assert!(position[1] < 1.0);
    }

    #[test]
    fn test_advance_at_origin_stays_finite() {
        let integrator = integrator();
        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];
        let mut age = 5.0;
        integrator.advance(&mut position, &mut velocity, &mut age, 12.0, 0.1);
        assert!(position.iter().chain(velocity.iter()).all(|v| v.is_finite()));

        let mut position = [1e-6, 0.0, -1e-6];
        integrator.advance(&mut position, &mut velocity, &mut age, 0.0, 0.1);
        assert!(position.iter().chain(velocity.iter()).all(|v| v.is_finite()));
    }

    #[test]
    fn test_step_leaves_inactive_slots() {
        let mut pool = ParticlePool::allocate(2, 0).unwrap();
        pool.positions.copy_from_slice(&[12.0, 0.0, 0.0, 12.0, 0.0, 0.0]);
        pool.initial_radii.copy_from_slice(&[12.0, 12.0]);
        pool.active[0] = true;

        integrator().step(&mut pool, 1.0 / 60.0);

        assert!(pool.age(0) > 0.0);
        assert_eq!(pool.age(1), 0.0);
        assert_eq!(pool.position(1), [12.0, 0.0, 0.0]);
    }
}
