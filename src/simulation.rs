use crate::appearance::AppearanceMapper;
use crate::bridge::{DirtyFlags, FrameView, RenderBridge};
use crate::config::SimulationConfig;
use crate::consumption::ConsumptionRule;
use crate::error::ConfigError;
use crate::integrator::Integrator;
use crate::pool::ParticlePool;
use crate::spawn::{SpawnSampler, SpawnScheduler};

/// Outcome of a single [`Simulation::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// The `dt` actually simulated, after clamping.
    pub dt: f32,
    pub spawned: usize,
    pub recycled: usize,
    pub active: usize,
}

/// `floor(capacity × fraction)`, where `fraction` is read as the decimal it
/// was written as. A product within the fraction's f32 rounding error of a
/// whole number counts as that number, so 10 × 0.7 is 7 and not 6.
fn initial_population(capacity: usize, fraction: f32) -> usize {
    let exact = capacity as f64 * fraction as f64;
    let nearest = exact.round();
    let tolerance = capacity as f64 * f32::EPSILON as f64;
    let count = if (exact - nearest).abs() <= tolerance {
        nearest
    } else {
        exact.floor()
    };
    (count.max(0.0) as usize).min(capacity)
}

/// The whole swarm: pool, schedule, forces, appearance and recycling, driven
/// one frame at a time by the host.
pub struct Simulation {
    pool: ParticlePool,
    scheduler: SpawnScheduler,
    sampler: SpawnSampler,
    integrator: Integrator,
    mapper: AppearanceMapper,
    consumption: ConsumptionRule,
    max_dt: f32,
    dirty: DirtyFlags,
    frame: u64,
    elapsed: f64,
    total_recycled: u64,
    seed: u64,
}

impl Simulation {
    /// Validates `config`, allocates the pool and pre-activates the initial
    /// share of slots across the spawn annulus.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut pool = ParticlePool::allocate(config.max_count, seed)?;
        let sampler = SpawnSampler::new(&config.spawn);
        let mapper = AppearanceMapper::new(config.appearance.clone(), config.consumption.inner_radius);
        let mut scheduler = SpawnScheduler::new(&config.spawn);

        let initial = initial_population(config.max_count, config.initial_active_fraction);
        for slot in 0..initial {
            let params = sampler.annulus(pool.rng_mut(), &mapper);
            pool.activate(slot, params);
        }
        scheduler.observe(pool.active_count());

        log::info!(
            "swarm ready: capacity {}, {} initially active, seed {:#x}",
            pool.capacity(),
            pool.active_count(),
            seed
        );

        Ok(Self {
            pool,
            scheduler,
            sampler,
            integrator: Integrator::new(config.dynamics),
            mapper,
            consumption: ConsumptionRule::new(&config.consumption),
            max_dt: config.max_dt,
            dirty: DirtyFlags::ALL,
            frame: 0,
            elapsed: 0.0,
            total_recycled: 0,
            seed,
        })
    }

    /// NaN and non-positive deltas become zero; anything above `max_dt` (a
    /// resumed window, a debugger pause) is capped.
    fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 {
            return 0.0;
        }
        if dt > self.max_dt {
            log::debug!("clamping frame dt {:.3}s to {:.3}s", dt, self.max_dt);
            return self.max_dt;
        }
        dt
    }

    /// Runs one frame: spawn, integrate, recolor, recycle, then flag the
    /// buffers dirty. A zero `dt` leaves every attribute untouched.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let dt = self.clamp_dt(dt);
        if dt == 0.0 {
            return TickReport {
                dt,
                active: self.pool.active_count(),
                ..Default::default()
            };
        }

        let spawned = self
            .scheduler
            .tick(dt, &mut self.pool, &self.sampler, &self.mapper);
        self.integrator.step(&mut self.pool, dt);
        self.mapper.apply(&mut self.pool);
        let recycled = self
            .consumption
            .apply(&mut self.pool, &self.sampler, &self.mapper);

        self.dirty.mark_all();
        self.frame += 1;
        self.elapsed += dt as f64;
        self.total_recycled += recycled as u64;

        if spawned > 0 || recycled > 0 {
            log::trace!(
                "frame {}: spawned {}, recycled {}, active {}",
                self.frame,
                spawned,
                recycled,
                self.pool.active_count()
            );
        }

        TickReport {
            dt,
            spawned,
            recycled,
            active: self.pool.active_count(),
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            positions: self.pool.positions(),
            colors: self.pool.colors(),
            sizes: self.pool.sizes(),
            opacities: self.pool.opacities(),
            active: self.pool.active(),
            dirty: self.dirty,
            active_count: self.pool.active_count(),
            frame: self.frame,
        }
    }

    /// Hands the buffers to `bridge` if anything changed since the last
    /// upload. Returns whether an upload happened.
    pub fn publish<B: RenderBridge + ?Sized>(&mut self, bridge: &mut B) -> bool {
        if !self.dirty.any() {
            return false;
        }
        bridge.upload(&self.view());
        self.dirty.clear();
        true
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds, after clamping.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn total_recycled(&self) -> u64 {
        self.total_recycled
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn inner_radius(&self) -> f32 {
        self.consumption.inner_radius()
    }
}
