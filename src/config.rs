//! Layered configuration.
//!
//! Every section deserializes with `#[serde(default)]`, so a JSON file only
//! has to name the values it changes:
//!
//! ```json
//! { "allocation": { "best_attacker_radius": 20 }, "game": { "turns": 80 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ai::AllocationConfig;
use crate::analysis::AnalysisConfig;
use crate::sites::SiteConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Turn-driver tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Turns played before the game is called a draw.
    pub turns: u32,
    /// Gold each army costs per turn.
    pub army_upkeep: u32,
    /// Let factions go after neutral cities when building capacity.
    pub take_neutrals: bool,
    /// Strength of armies produced by cities without their own production.
    pub produced_strength: u32,
    pub produced_moves: u32,
    /// Turns a city needs per produced army.
    pub production_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            turns: 50,
            army_upkeep: 1,
            take_neutrals: true,
            produced_strength: 3,
            produced_moves: 12,
            production_turns: 3,
        }
    }
}

/// Everything a game needs to be tuned.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub allocation: AllocationConfig,
    pub analysis: AnalysisConfig,
    pub sites: SiteConfig,
    pub game: GameConfig,
}

impl Config {
    /// Reads a JSON config file over the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.allocation;
        if a.defense_floor > a.defense_ceiling {
            return Err(ConfigError::Invalid {
                field: "allocation.defense_floor",
                reason: format!("{} exceeds defense_ceiling {}", a.defense_floor, a.defense_ceiling),
            });
        }
        if !(0.0..=1.0).contains(&a.empty_out_probability) {
            return Err(ConfigError::Invalid {
                field: "allocation.empty_out_probability",
                reason: format!("{} is not a probability", a.empty_out_probability),
            });
        }
        if a.tiles_per_move == 0 {
            return Err(ConfigError::Invalid {
                field: "allocation.tiles_per_move",
                reason: "must be positive".to_string(),
            });
        }
        if self.analysis.strength_scale <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "analysis.strength_scale",
                reason: "must be positive".to_string(),
            });
        }
        if self.game.production_turns == 0 {
            return Err(ConfigError::Invalid {
                field: "game.production_turns",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_carry_tuning_constants() {
        let config = Config::default();
        assert_eq!(config.allocation.attack_scan_radius, 2);
        assert_eq!(config.allocation.enemy_city_max_distance, 51);
        assert_eq!(config.allocation.best_attacker_radius, 27);
        assert_eq!(config.allocation.garrison_floor(), 7);
        assert!((config.allocation.capacity_danger_threshold - 0.5003).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_values() {
        let file = write_config(r#"{"allocation": {"best_attacker_radius": 20}, "game": {"turns": 80}}"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.allocation.best_attacker_radius, 20);
        assert_eq!(config.allocation.tiles_per_move, 7);
        assert_eq!(config.game.turns, 80);
        assert_eq!(config.sites, SiteConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let file = write_config("{\"allocation\": ");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn inverted_defense_clamp_is_rejected() {
        let file = write_config(r#"{"allocation": {"defense_floor": 12.0}}"#);
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "allocation.defense_floor",
                ..
            }
        ));
    }
}
