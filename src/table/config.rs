//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{GameSettings, constants};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Maximum number of seated players (default: 5)
    pub max_players: usize,

    /// Minimum seated players before the leader may start a hand
    pub min_players: usize,

    /// Bit length of the shared Sophie-Germain prime pair
    pub prime_bits: u32,

    /// How long the active player in a circle may take before the hand
    /// is aborted instead of deadlocking the table
    pub turn_deadline_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: constants::MAX_PLAYERS,
            min_players: constants::MIN_PLAYERS,
            prime_bits: constants::DEFAULT_PRIME_BITS,
            turn_deadline_secs: 60,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_players < 2 || self.max_players > constants::MAX_PLAYERS {
            return Err(format!(
                "Max players must be between 2 and {}",
                constants::MAX_PLAYERS
            ));
        }
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err("Min players must be between 2 and max players".to_string());
        }
        if !(8..=62).contains(&self.prime_bits) {
            return Err("Prime bits must be between 8 and 62".to_string());
        }
        if self.turn_deadline_secs == 0 {
            return Err("Turn deadline must be positive".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn turn_deadline(&self) -> Duration {
        Duration::from_secs(self.turn_deadline_secs)
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            max_players: self.max_players,
            min_players: self.min_players,
            prime_bits: self.prime_bits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TableConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let config = TableConfig {
            max_players: 9,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            min_players: 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig {
            prime_bits: 64,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
