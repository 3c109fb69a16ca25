//! Simulation configuration.
//!
//! Every tuning constant of the swarm lives here with its default. The force
//! curves are hand-tuned for the look of the disk, not derived from physics, so
//! the defaults should be treated as a matched set: changing one usually means
//! revisiting its neighbours.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed pool capacity (`maxCount`).
    pub max_count: usize,

    /// Share of the pool activated at construction (0.0-1.0)
    pub initial_active_fraction: f32,

    /// Upper clamp for a single frame's `dt`, in seconds
    pub max_dt: f32,

    pub spawn: SpawnConfig,
    pub dynamics: DynamicsConfig,
    pub consumption: ConsumptionConfig,
    pub appearance: AppearanceConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_count: 2000,
            initial_active_fraction: 0.5,
            max_dt: 0.1,
            spawn: SpawnConfig::default(),
            dynamics: DynamicsConfig::default(),
            consumption: ConsumptionConfig::default(),
            appearance: AppearanceConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Inner edge of the spawn annulus (`MIN_SPAWN_RADIUS`)
    pub min_radius: f32,

    /// Outer edge of the spawn annulus (`MAX_SPAWN_RADIUS`)
    pub max_radius: f32,

    /// Far-field spawns land within this distance inside `max_radius`
    pub far_field_jitter: f32,

    /// Full thickness of the vertical band particles spawn in
    pub disk_height: f32,

    /// Seconds between spawn batches
    pub interval: f32,

    /// Slots activated per batch
    pub batch_size: usize,

    /// Tangential per-frame velocity given to fresh particles
    pub initial_tangential_speed: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_radius: 10.0,
            max_radius: 14.0,
            far_field_jitter: 1.5,
            disk_height: 0.6,
            interval: 0.08,
            batch_size: 3,
            initial_tangential_speed: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Inward pull coefficient at age zero (`k0`)
    pub pull_base: f32,

    /// Growth of the pull coefficient per second of age (`k1`)
    pub pull_growth: f32,

    /// Scale applied to the radial pull when it is folded into velocity
    pub pull_amplification: f32,

    /// Extra pull once a particle has fallen below its spawn radius (0.0 disables)
    pub origin_bias: f32,

    /// Numerator of the orbital speed curve `c / sqrt(rXZ + 1)`
    pub orbital_gain: f32,

    /// Rate at which `y` is pulled back toward the disk plane
    pub vertical_damping: f32,

    /// Per-frame velocity multiplier
    pub drag: f32,

    /// Guard added to radii before dividing
    pub epsilon: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            pull_base: 0.015,
            pull_growth: 0.003,
            pull_amplification: 10.0,
            origin_bias: 0.25,
            orbital_gain: 0.015,
            vertical_damping: 0.8,
            drag: 0.995,
            epsilon: 1e-3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionConfig {
    /// Particles closer than this to the attractor are recycled
    pub inner_radius: f32,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self { inner_radius: 1.2 }
    }
}

/// Radii separating the color bands. A particle belongs to the first band whose
/// threshold it exceeds: far, then mid, then near, else very-near.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    pub far: f32,
    pub mid: f32,
    pub near: f32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            far: 8.0,
            mid: 5.0,
            near: 4.0,
        }
    }
}

/// Color endpoints for one band; `heat` blends from `cool` to `hot`.
///
/// An endpoint missing from a preset falls back to white.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandColor {
    pub cool: [f32; 3],
    pub hot: [f32; 3],
}

impl Default for BandColor {
    fn default() -> Self {
        Self {
            cool: [1.0; 3],
            hot: [1.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub far: BandColor,
    pub mid: BandColor,
    pub near: BandColor,
    pub very_near: BandColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            far: BandColor {
                cool: [0.25, 0.35, 0.9],
                hot: [0.45, 0.4, 1.0],
            },
            mid: BandColor {
                cool: [0.55, 0.3, 0.95],
                hot: [0.9, 0.35, 0.75],
            },
            near: BandColor {
                cool: [1.0, 0.45, 0.2],
                hot: [1.0, 0.7, 0.3],
            },
            // Above 1.0 on purpose: the renderer treats it as bloom headroom
            very_near: BandColor {
                cool: [1.0, 0.85, 0.6],
                hot: [1.4, 1.3, 1.1],
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub bands: BandThresholds,
    pub palette: Palette,

    /// `H` in `heat = max(0, 1 - r / H)`
    pub heat_scale: f32,

    /// Point-sprite scale at the outer edge
    pub base_size: f32,

    /// Relative size gain at full heat
    pub size_growth: f32,

    /// Below this radius sprites shrink linearly to zero at the inner radius
    pub shrink_radius: f32,

    /// Opacity falls off as `min(1, r / fade_distance)`
    pub fade_distance: f32,

    /// Opacity gained per second of age
    pub fade_in_rate: f32,

    /// Opacity a particle starts from on every (re)spawn
    pub restart_opacity: f32,

    /// Cap on the age fade-in
    pub max_opacity: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            bands: BandThresholds::default(),
            palette: Palette::default(),
            heat_scale: 10.0,
            base_size: 1.0,
            size_growth: 0.6,
            shrink_radius: 4.0,
            fade_distance: 3.0,
            fade_in_rate: 0.5,
            restart_opacity: 0.05,
            max_opacity: 1.0,
        }
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn within(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

impl SimulationConfig {
    /// Checks every construction-time contract. Nothing is clamped: the first
    /// violated bound is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_count == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        within("initial_active_fraction", self.initial_active_fraction, 0.0, 1.0)?;
        positive("max_dt", self.max_dt)?;

        let spawn = &self.spawn;
        positive("spawn.min_radius", spawn.min_radius)?;
        positive("spawn.max_radius", spawn.max_radius)?;
        if spawn.min_radius >= spawn.max_radius {
            return Err(ConfigError::SpawnRadii {
                min: spawn.min_radius,
                max: spawn.max_radius,
            });
        }
        within(
            "spawn.far_field_jitter",
            spawn.far_field_jitter,
            0.0,
            spawn.max_radius - spawn.min_radius,
        )?;
        within("spawn.disk_height", spawn.disk_height, 0.0, spawn.min_radius)?;
        positive("spawn.interval", spawn.interval)?;
        if spawn.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        within(
            "spawn.initial_tangential_speed",
            spawn.initial_tangential_speed,
            0.0,
            f32::MAX,
        )?;

        let dynamics = &self.dynamics;
        within("dynamics.pull_base", dynamics.pull_base, 0.0, f32::MAX)?;
        positive("dynamics.pull_growth", dynamics.pull_growth)?;
        positive("dynamics.pull_amplification", dynamics.pull_amplification)?;
        within("dynamics.origin_bias", dynamics.origin_bias, 0.0, f32::MAX)?;
        within("dynamics.orbital_gain", dynamics.orbital_gain, 0.0, f32::MAX)?;
        within("dynamics.vertical_damping", dynamics.vertical_damping, 0.0, f32::MAX)?;
        positive("dynamics.drag", dynamics.drag)?;
        within("dynamics.drag", dynamics.drag, 0.0, 1.0)?;
        positive("dynamics.epsilon", dynamics.epsilon)?;

        let inner = self.consumption.inner_radius;
        positive("consumption.inner_radius", inner)?;
        if inner >= spawn.min_radius {
            return Err(ConfigError::SpawnInsideConsumption {
                inner,
                min: spawn.min_radius,
            });
        }

        let look = &self.appearance;
        let bands = look.bands;
        let ordered = bands.far.is_finite()
            && bands.far > bands.mid
            && bands.mid > bands.near
            && bands.near >= inner;
        if !ordered {
            return Err(ConfigError::BandOrder {
                far: bands.far,
                mid: bands.mid,
                near: bands.near,
                inner,
            });
        }
        positive("appearance.heat_scale", look.heat_scale)?;
        positive("appearance.base_size", look.base_size)?;
        within("appearance.size_growth", look.size_growth, 0.0, f32::MAX)?;
        positive("appearance.shrink_radius", look.shrink_radius)?;
        if look.shrink_radius <= inner {
            return Err(ConfigError::OutOfRange {
                name: "appearance.shrink_radius",
                value: look.shrink_radius,
                min: inner,
                max: f32::MAX,
            });
        }
        positive("appearance.fade_distance", look.fade_distance)?;
        within("appearance.fade_in_rate", look.fade_in_rate, 0.0, f32::MAX)?;
        within("appearance.max_opacity", look.max_opacity, 0.0, 1.0)?;
        within(
            "appearance.restart_opacity",
            look.restart_opacity,
            0.0,
            look.max_opacity,
        )?;

        Ok(())
    }

    /// Parses a JSON preset. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SimulationConfig {
            max_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_inverted_spawn_radii_rejected() {
        let mut config = SimulationConfig::default();
        config.spawn.min_radius = 14.0;
        config.spawn.max_radius = 14.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnRadii { .. })
        ));
    }

    #[test]
    fn test_fraction_is_not_clamped() {
        let config = SimulationConfig {
            initial_active_fraction: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                name: "initial_active_fraction",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let mut config = SimulationConfig::default();
        config.dynamics.drag = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_consumption_radius_must_sit_inside_spawn_annulus() {
        let mut config = SimulationConfig::default();
        config.consumption.inner_radius = 11.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_band_order() {
        let mut config = SimulationConfig::default();
        config.appearance.bands.mid = 9.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BandOrder { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json(r#"{ "max_count": 64, "spawn": { "batch_size": 5 } }"#)
            .unwrap();
        assert_eq!(config.max_count, 64);
        assert_eq!(config.spawn.batch_size, 5);
        assert_eq!(config.spawn.interval, SpawnConfig::default().interval);
        assert_eq!(config.dynamics, DynamicsConfig::default());
    }

    #[test]
    fn test_partial_palette_uses_defaults() {
        let config = SimulationConfig::from_json(
            r#"{ "appearance": { "palette": { "far": { "cool": [1, 1, 1] } } } }"#,
        )
        .unwrap();
        let palette = config.appearance.palette;
        assert_eq!(palette.far.cool, [1.0, 1.0, 1.0]);
        assert_eq!(palette.far.hot, BandColor::default().hot);
        assert_eq!(palette.mid, Palette::default().mid);
        assert_eq!(palette.very_near, Palette::default().very_near);
    }

    #[test]
    fn test_json_validation_applies() {
        let err = SimulationConfig::from_json(r#"{ "max_count": 0 }"#).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn test_json_round_trip_preserves_palette() {
        let config = SimulationConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(SimulationConfig::from_json(&json).unwrap(), config);
    }
}
