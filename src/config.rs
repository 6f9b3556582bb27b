//! Configuration management for utxochain

use crate::blockchain::DEFAULT_CUTOFF_AGE;
use crate::error::{ChainError, Result};
use crate::transaction::Amount;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_cutoff_age")]
    pub cutoff_age: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            cutoff_age: default_cutoff_age(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level> {
        tracing::Level::from_str(&self.level)
            .map_err(|_| ChainError::ConfigError(format!("unknown log level '{}'", self.level)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_block_reward")]
    pub block_reward: Amount,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            block_reward: default_block_reward(),
        }
    }
}

fn default_cutoff_age() -> u64 {
    DEFAULT_CUTOFF_AGE
}

fn default_level() -> String {
    "info".to_string()
}

fn default_block_reward() -> Amount {
    25
}

/// Reads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config: Config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.chain.cutoff_age == 0 {
            return Err(ChainError::ConfigError(
                "chain.cutoff_age must be at least 1".to_string(),
            ));
        }
        if self.simulation.block_reward < 0 {
            return Err(ChainError::ConfigError(
                "simulation.block_reward must not be negative".to_string(),
            ));
        }
        self.logging.max_level()?;
        Ok(())
    }
}
