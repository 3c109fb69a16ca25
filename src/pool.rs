//! Fixed-capacity particle storage.
//!
//! Attributes are kept as parallel arrays indexed by slot so the render side
//! can read them as flat float buffers. The arrays are boxed slices: once the
//! pool is allocated nothing can grow or shrink them.

use cgmath::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::appearance::Appearance;
use crate::error::ConfigError;

/// Everything a slot needs to (re)enter the swarm. Age is implied to be zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnParams {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub initial_radius: f32,
    pub appearance: Appearance,
}

pub struct ParticlePool {
    pub(crate) positions: Box<[f32]>,
    pub(crate) velocities: Box<[f32]>,
    pub(crate) colors: Box<[f32]>,
    pub(crate) sizes: Box<[f32]>,
    pub(crate) opacities: Box<[f32]>,
    pub(crate) ages: Box<[f32]>,
    pub(crate) initial_radii: Box<[f32]>,
    pub(crate) active: Box<[bool]>,
    active_count: usize,
    /// Lowest slot that may still be inactive.
    cursor: usize,
    rng: StdRng,
}

pub(crate) fn radius_of(position: &[f32]) -> f32 {
    cgmath::vec3(position[0], position[1], position[2]).magnitude()
}

impl ParticlePool {
    /// Allocates zeroed storage for `capacity` slots, all inactive.
    pub fn allocate(capacity: usize, seed: u64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Self {
            positions: vec![0.0; capacity * 3].into_boxed_slice(),
            velocities: vec![0.0; capacity * 3].into_boxed_slice(),
            colors: vec![0.0; capacity * 3].into_boxed_slice(),
            sizes: vec![0.0; capacity].into_boxed_slice(),
            opacities: vec![0.0; capacity].into_boxed_slice(),
            ages: vec![0.0; capacity].into_boxed_slice(),
            initial_radii: vec![0.0; capacity].into_boxed_slice(),
            active: vec![false; capacity].into_boxed_slice(),
            active_count: 0,
            cursor: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn capacity(&self) -> usize {
        self.active.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_full(&self) -> bool {
        self.active_count == self.capacity()
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    /// Activates an inactive slot with fresh state.
    ///
    /// Returns `false` without touching anything when `slot` is out of range or
    /// already active; recycling a live slot goes through [`Self::respawn`].
    pub fn activate(&mut self, slot: usize, params: SpawnParams) -> bool {
        if slot >= self.capacity() || self.active[slot] {
            return false;
        }
        self.write(slot, params);
        self.active[slot] = true;
        self.active_count += 1;
        true
    }

    /// Resets a live slot in place. The slot stays active.
    pub(crate) fn respawn(&mut self, slot: usize, params: SpawnParams) {
        debug_assert!(self.active[slot]);
        self.write(slot, params);
    }

    /// Finds the lowest inactive slot.
    pub fn next_inactive(&mut self) -> Option<usize> {
        while self.cursor < self.capacity() && self.active[self.cursor] {
            self.cursor += 1;
        }
        (self.cursor < self.capacity()).then_some(self.cursor)
    }

    // Age and spawn radius are only ever assigned here.
    fn write(&mut self, slot: usize, params: SpawnParams) {
        let xyz = slot * 3..slot * 3 + 3;
        self.positions[xyz.clone()].copy_from_slice(&params.position);
        self.velocities[xyz.clone()].copy_from_slice(&params.velocity);
        self.colors[xyz].copy_from_slice(&params.appearance.color);
        self.sizes[slot] = params.appearance.size;
        self.opacities[slot] = params.appearance.opacity;
        self.ages[slot] = 0.0;
        self.initial_radii[slot] = params.initial_radius;
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn position(&self, slot: usize) -> [f32; 3] {
        let p = &self.positions[slot * 3..slot * 3 + 3];
        [p[0], p[1], p[2]]
    }

    pub fn velocity(&self, slot: usize) -> [f32; 3] {
        let v = &self.velocities[slot * 3..slot * 3 + 3];
        [v[0], v[1], v[2]]
    }

    pub fn radius(&self, slot: usize) -> f32 {
        radius_of(&self.positions[slot * 3..slot * 3 + 3])
    }

    pub fn age(&self, slot: usize) -> f32 {
        self.ages[slot]
    }

    pub fn initial_radius(&self, slot: usize) -> f32 {
        self.initial_radii[slot]
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn opacities(&self) -> &[f32] {
        &self.opacities
    }

    pub fn ages(&self) -> &[f32] {
        &self.ages
    }

    pub fn active(&self) -> &[bool] {
        &self.active
    }
}
