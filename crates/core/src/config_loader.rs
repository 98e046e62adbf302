use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::config::SimulationConfig;

/// Default location of the simulation configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Simulation.toml";

/// Prefix for environment overrides, e.g. `MATCHBOOT_SAMPLE_SIZE=500`.
pub const ENV_PREFIX: &str = "MATCHBOOT_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the simulation configuration from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the merged
    /// configuration is invalid.
    pub fn load() -> Result<SimulationConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads the simulation configuration by merging defaults, a TOML file,
    /// and environment variables, in that order. A missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the merged
    /// configuration is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<SimulationConfig> {
        let path = path.as_ref();
        let config: SimulationConfig = Figment::from(Serialized::defaults(
            SimulationConfig::default(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded simulation configuration");

        Ok(config)
    }
}
