//! Platform configuration file (TOML)
//!
//! Example:
//! ```toml
//! gitswarm_address = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4"
//!
//! [gitswarm_token]
//! name = "GitSwarm"
//! symbol = "GS"
//! initial_supply = "1000000000000000000000"
//! buffer = "100000000000000000000"
//!
//! [parameters.VoteDuration]
//! default = "3600"
//! min = "60"
//! ```
//!
//! Token amounts exceed the TOML integer range, so amounts and parameter
//! values are written as decimal strings.

use gitswarm_core::amount::decimal;
use gitswarm_core::{Address, Amount, ONE_TOKEN};
use governance::{ParameterBounds, ParameterKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid bounds for {key}: min {min}, default {default}, max {max}")]
    InvalidBounds {
        key: ParameterKey,
        min: u128,
        default: u128,
        max: u128,
    },
}

/// Token deployed for the GitSwarm project (project 0) at initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Minted to the GitSwarm address
    #[serde(with = "decimal")]
    pub initial_supply: Amount,
    /// Minted to the Funds Manager and booked to project 0
    #[serde(with = "decimal")]
    pub buffer: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "GitSwarm".to_string(),
            symbol: "GS".to_string(),
            initial_supply: 1_000 * ONE_TOKEN,
            buffer: 100 * ONE_TOKEN,
        }
    }
}

/// Partial override of a parameter's default and bounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverride {
    #[serde(default, with = "decimal::option", skip_serializing_if = "Option::is_none")]
    pub default: Option<u128>,
    #[serde(default, with = "decimal::option", skip_serializing_if = "Option::is_none")]
    pub min: Option<u128>,
    #[serde(default, with = "decimal::option", skip_serializing_if = "Option::is_none")]
    pub max: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Privileged platform address; may vote without holding tokens
    pub gitswarm_address: Address,
    pub gitswarm_token: TokenConfig,
    /// Keyed by parameter name, e.g. `VoteDuration`
    pub parameters: BTreeMap<String, ParameterOverride>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            gitswarm_address: Address::from_label("gitswarm"),
            gitswarm_token: TokenConfig::default(),
            parameters: BTreeMap::new(),
        }
    }
}

impl PlatformConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PlatformConfig = toml::from_str(contents)?;
        config.parameter_bounds()?;
        Ok(config)
    }

    /// Built-in bounds with the configured overrides applied
    pub fn parameter_bounds(&self) -> Result<BTreeMap<ParameterKey, ParameterBounds>, ConfigError> {
        let mut bounds = BTreeMap::new();
        for (name, value) in &self.parameters {
            let key: ParameterKey = name
                .parse()
                .map_err(|_| ConfigError::UnknownParameter(name.clone()))?;
            let base = key.default_bounds();
            let merged = ParameterBounds {
                default: value.default.unwrap_or(base.default),
                min: value.min.unwrap_or(base.min),
                max: value.max.unwrap_or(base.max),
            };
            if !merged.contains(merged.default) {
                return Err(ConfigError::InvalidBounds {
                    key,
                    min: merged.min,
                    default: merged.default,
                    max: merged.max,
                });
            }
            bounds.insert(key, merged);
        }
        Ok(bounds)
    }
}
