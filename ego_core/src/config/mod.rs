//! Configuration utilities for the host loop and your game.

use std::time::Duration;

use semver::Version;

/// This struct represents general configuration of the host loop.
#[derive(Debug, Clone)]
pub struct Config {
    name: String,
    version: Version,
    enable_validation: bool,
    fixed_timestep: Duration,
    max_fixed_steps: u32,
}

pub const ENGINE_NAME: &str = env!("CARGO_CRATE_NAME", "library must be compiled by Cargo");

const ENGINE_VERSION_STR: &str = env!("CARGO_PKG_VERSION", "library must be compiled by Cargo");
lazy_static::lazy_static! {
    pub static ref ENGINE_VERSION: Version = Version::parse(ENGINE_VERSION_STR)
        .unwrap_or_else(|_| Version::new(0, 0, 0));
}

/// Default duration of one fixed update step.
pub const DEFAULT_FIXED_TIMESTEP: Duration = Duration::from_millis(20);

/// Default limit of fixed update steps per one frame.
pub const DEFAULT_MAX_FIXED_STEPS: u32 = 8;

impl Config {
    /// Creates new configuration with given name, version and validation usage.
    pub const fn new(name: String, version: Version, enable_validation: bool) -> Self {
        Self {
            name,
            version,
            enable_validation,
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            max_fixed_steps: DEFAULT_MAX_FIXED_STEPS,
        }
    }

    /// Sets duration of one fixed update step.
    ///
    /// Zero duration disables fixed updates.
    ///
    pub fn with_fixed_timestep(mut self, fixed_timestep: Duration) -> Self {
        self.fixed_timestep = fixed_timestep;
        self
    }

    /// Sets limit of fixed update steps per one frame.
    pub fn with_max_fixed_steps(mut self, max_fixed_steps: u32) -> Self {
        self.max_fixed_steps = max_fixed_steps;
        self
    }

    /// Name of your game.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semver version of your game.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// If bundles of every system are compared with the full scan
    /// of entities after each frame (useful for debugging).
    pub fn enable_validation(&self) -> bool {
        self.enable_validation
    }

    /// Duration of one fixed update step.
    pub fn fixed_timestep(&self) -> Duration {
        self.fixed_timestep
    }

    /// Limit of fixed update steps per one frame.
    ///
    /// Time which needs more steps than this is dropped.
    ///
    pub fn max_fixed_steps(&self) -> u32 {
        self.max_fixed_steps
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "Hello World".to_string(),
            Version::new(0, 0, 0),
            cfg!(debug_assertions),
        )
    }
}
