//! A particle swarm spiralling into a central attractor.
//!
//! Particles spawn on a far ring, circle inward under hand-tuned forces, warm up
//! and shrink as they close in, and are recycled at the far ring once they
//! cross the inner radius. The pool never grows or shrinks: after the initial
//! ramp every slot stays live and is reused indefinitely.
//!
//! The crate only simulates. A renderer implements [`RenderBridge`] and
//! receives flat, read-only attribute buffers once per frame:
//!
//! ```ignore
//! let mut sim = Simulation::new(SimulationConfig::default(), 42)?;
//! let mut clock = FrameClock::new();
//! loop {
//!     sim.tick(clock.delta(Instant::now()));
//!     sim.publish(&mut renderer);
//! }
//! ```

pub mod appearance;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod consumption;
pub mod error;
pub mod integrator;
pub mod pool;
pub mod simulation;
pub mod spawn;

pub use appearance::{Appearance, AppearanceMapper, Band};
pub use bridge::{DirtyFlags, FrameView, RenderBridge};
pub use clock::FrameClock;
pub use config::{
    AppearanceConfig, BandColor, BandThresholds, ConsumptionConfig, DynamicsConfig, Palette,
    SimulationConfig, SpawnConfig,
};
pub use consumption::{ConsumptionRule, OrbitState};
pub use error::{ConfigError, LoadError};
pub use integrator::Integrator;
pub use pool::{ParticlePool, SpawnParams};
pub use simulation::{Simulation, TickReport};
pub use spawn::{SpawnSampler, SpawnScheduler};
