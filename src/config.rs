//! Match configuration.
//!
//! Defaults match the physical game. A config can be loaded from JSON or
//! tweaked one option at a time through `setoption`.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or editing a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Tunable rules and engine settings for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for deck shuffles and the upgrade deck; 0 draws from entropy.
    pub seed: u64,
    /// Number of cards dealt into a hand each round.
    pub hand_size: usize,
    /// Energy each robot starts with.
    pub starting_energy: u32,
    /// Upgrade slots per kind (permanent and temporary).
    pub upgrade_slots: usize,
    /// Cards on display in the upgrade shop; 0 means one per player.
    pub shop_size: usize,
    /// Manhattan radius a played virus spreads over.
    pub virus_radius: u32,
    /// How long a match session keeps fired laser beams before clearing
    /// them; 0 keeps them until the next register.
    pub laser_display_ms: u64,
    /// Whether the protocol's `run` resolves a single card, like `step`.
    pub step_mode: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            seed: 0,
            hand_size: 8,
            starting_energy: 5,
            upgrade_slots: 3,
            shop_size: 0,
            virus_radius: 6,
            laser_display_ms: 500,
            step_mode: false,
        }
    }
}

impl GameConfig {
    /// Parses a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Sets a single option by its protocol name.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let raw = value.unwrap_or("");
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        };
        match name {
            "Seed" => self.seed = raw.parse().map_err(|_| invalid())?,
            "HandSize" => {
                let n: usize = raw.parse().map_err(|_| invalid())?;
                if n < crate::board::NO_REGISTERS {
                    return Err(invalid());
                }
                self.hand_size = n;
            }
            "StartingEnergy" => self.starting_energy = raw.parse().map_err(|_| invalid())?,
            "UpgradeSlots" => self.upgrade_slots = raw.parse().map_err(|_| invalid())?,
            "ShopSize" => self.shop_size = raw.parse().map_err(|_| invalid())?,
            "VirusRadius" => self.virus_radius = raw.parse().map_err(|_| invalid())?,
            "LaserDisplayMs" => self.laser_display_ms = raw.parse().map_err(|_| invalid())?,
            "StepMode" => self.step_mode = raw.parse().map_err(|_| invalid())?,
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        Ok(())
    }
}
