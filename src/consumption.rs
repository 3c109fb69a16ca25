//! Recycling of particles that reach the attractor.

use crate::appearance::AppearanceMapper;
use crate::config::ConsumptionConfig;
use crate::pool::ParticlePool;
use crate::spawn::SpawnSampler;

/// Where a particle stands relative to the inner radius.
///
/// `Consumed` never outlives the frame it is detected in: the slot is
/// respawned immediately and is orbiting again by the end of the tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbitState {
    Orbiting,
    Consumed,
}

#[derive(Clone, Debug)]
pub struct ConsumptionRule {
    inner_radius: f32,
}

impl ConsumptionRule {
    pub fn new(consumption: &ConsumptionConfig) -> Self {
        Self {
            inner_radius: consumption.inner_radius,
        }
    }

    pub fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    pub fn state(&self, r: f32) -> OrbitState {
        if r < self.inner_radius {
            OrbitState::Consumed
        } else {
            OrbitState::Orbiting
        }
    }

    /// Respawns every active slot inside the inner radius at the far field.
    /// Returns how many were recycled.
    pub fn apply(
        &self,
        pool: &mut ParticlePool,
        sampler: &SpawnSampler,
        mapper: &AppearanceMapper,
    ) -> usize {
        let mut recycled = 0;
        for slot in 0..pool.capacity() {
            if !pool.is_active(slot) || self.state(pool.radius(slot)) == OrbitState::Orbiting {
                continue;
            }
            let params = sampler.far_field(pool.rng_mut(), mapper);
            pool.respawn(slot, params);
            recycled += 1;
        }
        recycled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    struct Fixture {
        config: SimulationConfig,
        sampler: SpawnSampler,
        mapper: AppearanceMapper,
        rule: ConsumptionRule,
    }

    fn fixture() -> Fixture {
        let config = SimulationConfig::default();
        Fixture {
            sampler: SpawnSampler::new(&config.spawn),
            mapper: AppearanceMapper::new(config.appearance.clone(), config.consumption.inner_radius),
            rule: ConsumptionRule::new(&config.consumption),
            config,
        }
    }

    #[test]
    fn test_state_threshold() {
        let f = fixture();
        assert_eq!(f.rule.state(0.0), OrbitState::Consumed);
        assert_eq!(f.rule.state(1.19), OrbitState::Consumed);
        assert_eq!(f.rule.state(1.2), OrbitState::Orbiting);
        assert_eq!(f.rule.state(12.0), OrbitState::Orbiting);
    }

    #[test]
    fn test_consumed_slot_respawns_in_place() {
        let f = fixture();
        let mut pool = ParticlePool::allocate(2, 42).unwrap();
        let mut rng_params = |r: f32| {
            let mut p = f.sampler.annulus(pool.rng_mut(), &f.mapper);
            p.position = [r, 0.0, 0.0];
            p
        };
        let inside = rng_params(0.5);
        let outside = rng_params(6.0);
        pool.activate(0, inside);
        pool.activate(1, outside);
        pool.ages[0] = 7.0;
        pool.ages[1] = 7.0;

        let recycled = f.rule.apply(&mut pool, &f.sampler, &f.mapper);

        assert_eq!(recycled, 1);
        assert!(pool.is_active(0));
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.age(0), 0.0);
        assert!(pool.radius(0) >= f.config.spawn.min_radius);
        assert!((pool.radius(0) - pool.initial_radius(0)).abs() < 1e-4);
        assert_eq!(pool.opacities()[0], f.config.appearance.restart_opacity);

        assert_eq!(pool.age(1), 7.0);
        assert_eq!(pool.position(1), [6.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inactive_slots_are_left_alone() {
        let f = fixture();
        let mut pool = ParticlePool::allocate(3, 0).unwrap();
        assert_eq!(f.rule.apply(&mut pool, &f.sampler, &f.mapper), 0);
        assert_eq!(pool.active_count(), 0);
        assert!(pool.positions().iter().all(|&v| v == 0.0));
    }
}
