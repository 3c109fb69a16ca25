//! Error types for simulation construction and config loading.

use thiserror::Error;

/// A configuration value that violates a construction-time contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pool capacity must be greater than zero")]
    ZeroCapacity,

    #[error("spawn batch size must be at least one")]
    ZeroBatch,

    #[error("spawn radii must satisfy min < max (got min {min}, max {max})")]
    SpawnRadii { min: f32, max: f32 },

    #[error("inner consumption radius {inner} must be smaller than the minimum spawn radius {min}")]
    SpawnInsideConsumption { inner: f32, min: f32 },

    #[error(
        "distance bands must be ordered far > mid > near >= inner radius \
         (got far {far}, mid {mid}, near {near}, inner {inner})"
    )]
    BandOrder {
        far: f32,
        mid: f32,
        near: f32,
        inner: f32,
    },

    #[error("{name} must be finite and greater than zero (got {value})")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} must lie within [{min}, {max}] (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Errors raised while reading a configuration preset from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
