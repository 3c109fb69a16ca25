//! Spawn placement and the time-driven spawn schedule.

use std::f32::consts::TAU;

use rand::Rng;

use crate::appearance::AppearanceMapper;
use crate::config::SpawnConfig;
use crate::pool::{ParticlePool, SpawnParams};

/// Draws fresh particle state.
///
/// Positions lie on the sphere of the sampled radius, inside a thin band around
/// the disk plane, so `|position|` is exactly the radius that becomes the
/// slot's `initial_radius`.
#[derive(Clone, Debug)]
pub struct SpawnSampler {
    min_radius: f32,
    max_radius: f32,
    jitter: f32,
    half_height: f32,
    tangential_speed: f32,
}

impl SpawnSampler {
    pub fn new(spawn: &SpawnConfig) -> Self {
        Self {
            min_radius: spawn.min_radius,
            max_radius: spawn.max_radius,
            jitter: spawn.far_field_jitter,
            half_height: spawn.disk_height * 0.5,
            tangential_speed: spawn.initial_tangential_speed,
        }
    }

    /// Uniform radius across the whole spawn annulus. Used to seed the pool.
    pub fn annulus<R: Rng + ?Sized>(&self, rng: &mut R, mapper: &AppearanceMapper) -> SpawnParams {
        let radius = rng.gen_range(self.min_radius..=self.max_radius);
        self.place(rng, radius, mapper)
    }

    /// Just inside the outer edge, for scheduled spawns and recycling.
    pub fn far_field<R: Rng + ?Sized>(&self, rng: &mut R, mapper: &AppearanceMapper) -> SpawnParams {
        let radius = self.max_radius - rng.gen_range(0.0..=self.jitter);
        self.place(rng, radius, mapper)
    }

    fn place<R: Rng + ?Sized>(&self, rng: &mut R, radius: f32, mapper: &AppearanceMapper) -> SpawnParams {
        let azimuth = rng.gen_range(0.0..TAU);
        let y = rng.gen_range(-self.half_height..=self.half_height);
        let planar = (radius * radius - y * y).max(0.0).sqrt();
        let (sin, cos) = azimuth.sin_cos();

        SpawnParams {
            position: [planar * cos, y, planar * sin],
            velocity: [-sin * self.tangential_speed, 0.0, cos * self.tangential_speed],
            initial_radius: radius,
            appearance: mapper.map(radius, 0.0),
        }
    }
}

/// Activates a small batch of slots at a fixed cadence until the pool is full.
#[derive(Clone, Debug)]
pub struct SpawnScheduler {
    interval: f32,
    batch_size: usize,
    accumulator: f32,
    high_water: usize,
}

impl SpawnScheduler {
    pub fn new(spawn: &SpawnConfig) -> Self {
        Self {
            interval: spawn.interval,
            batch_size: spawn.batch_size,
            accumulator: 0.0,
            high_water: 0,
        }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Highest active count observed so far.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Returns the number of slots activated this tick.
    pub fn tick(
        &mut self,
        dt: f32,
        pool: &mut ParticlePool,
        sampler: &SpawnSampler,
        mapper: &AppearanceMapper,
    ) -> usize {
        if pool.is_full() {
            return 0;
        }
        self.accumulator += dt;
        if self.accumulator <= self.interval {
            return 0;
        }
        self.accumulator = 0.0;

        let wanted = self.batch_size.min(pool.capacity() - pool.active_count());
        let mut spawned = 0;
        while spawned < wanted {
            let Some(slot) = pool.next_inactive() else {
                break;
            };
            let params = sampler.far_field(pool.rng_mut(), mapper);
            if pool.activate(slot, params) {
                spawned += 1;
            }
        }

        if pool.active_count() > self.high_water {
            self.high_water = pool.active_count();
            if pool.is_full() {
                log::debug!("particle pool reached capacity ({} slots)", pool.capacity());
            }
        }
        spawned
    }

    pub(crate) fn observe(&mut self, active_count: usize) {
        self.high_water = self.high_water.max(active_count);
    }
}
