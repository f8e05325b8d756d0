//! Arcade settings
//!
//! Loaded from a JSON file; anything missing falls back to the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::{AiConfig, KeyMap};
use crate::error::ConfigError;
use crate::sim::InstanceConfig;

/// Automated-player difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Decision interval (ms)
    pub fn reaction_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 320.0,
            Difficulty::Medium => 150.0,
            Difficulty::Hard => 70.0,
        }
    }

    /// Recognition delay after each spawn (ms)
    pub fn startup_delay_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 600.0,
            Difficulty::Medium => 350.0,
            Difficulty::Hard => 150.0,
        }
    }

    /// Soft-drop eagerness once aligned
    pub fn aggression(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.1,
            Difficulty::Medium => 0.35,
            Difficulty::Hard => 0.6,
        }
    }

    /// AI tuning for this preset
    pub fn ai_config(&self) -> AiConfig {
        AiConfig {
            reaction_ms: self.reaction_ms(),
            startup_delay_ms: self.startup_delay_ms(),
            aggression: self.aggression(),
            ..AiConfig::default()
        }
    }
}

/// One play surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    /// No key map means the surface is played by the automated controller
    #[serde(default)]
    pub keys: Option<KeyMap>,
}

impl PlayerConfig {
    pub fn human(name: &str, keys: KeyMap) -> Self {
        Self {
            name: name.to_string(),
            keys: Some(keys),
        }
    }

    pub fn automated(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keys: None,
        }
    }

    /// Human only with a non-empty key map
    pub fn is_human(&self) -> bool {
        self.keys.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Arcade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rules and physics tuning shared by every surface
    pub instance: InstanceConfig,
    /// Preset the AI config is derived from
    pub difficulty: Difficulty,
    /// Scales the AI's soft-drop chance
    pub aggression_multiplier: f32,
    /// Mode label stored with reported scores
    pub game_mode: String,
    /// Surfaces, left to right
    pub players: Vec<PlayerConfig>,
    /// Leaderboard file; scores are only logged when unset
    pub leaderboard: Option<PathBuf>,
    /// Base RNG seed (each surface offsets it)
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instance: InstanceConfig::default(),
            difficulty: Difficulty::Medium,
            aggression_multiplier: 1.0,
            game_mode: "standard".to_string(),
            players: vec![
                PlayerConfig::human("Player 1", KeyMap::wasd()),
                PlayerConfig::human("Player 2", KeyMap::arrows()),
                PlayerConfig::automated("Computer"),
            ],
            leaderboard: None,
            seed: 0x5eed,
        }
    }
}

impl Settings {
    pub fn ai_config(&self) -> AiConfig {
        self.difficulty.ai_config()
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cfg = &self.instance;
        if cfg.piece_min_size <= 0.0 || cfg.piece_min_size > cfg.piece_max_size {
            return Err(ConfigError::Invalid("piece size range"));
        }
        if cfg.layout.width <= 2.0 * cfg.layout.zone_width {
            return Err(ConfigError::Invalid("surface narrower than its boundary strips"));
        }
        if cfg.falling_velocity_threshold < 0.0 {
            return Err(ConfigError::Invalid("falling velocity threshold"));
        }
        if self.aggression_multiplier < 0.0 {
            return Err(ConfigError::Invalid("aggression multiplier"));
        }
        Ok(())
    }

    /// Load settings from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = match fs::read_to_string(path) {
            Ok(json) => {
                let settings: Settings = serde_json::from_str(&json)?;
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("brutal"), None);
        assert_eq!(Difficulty::Easy.as_str(), "Easy");
    }

    #[test]
    fn test_harder_reacts_faster() {
        assert!(Difficulty::Hard.reaction_ms() < Difficulty::Easy.reaction_ms());
        let ai = Difficulty::Hard.ai_config();
        assert_eq!(ai.reaction_ms, 70.0);
        assert_eq!(ai.merge_tolerance, AiConfig::default().merge_tolerance);
    }

    #[test]
    fn test_player_without_keys_is_automated() {
        assert!(!PlayerConfig::automated("cpu").is_human());
        assert!(PlayerConfig::human("p1", KeyMap::wasd()).is_human());
        assert!(!PlayerConfig::human("p1", KeyMap::new()).is_human());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "difficulty": "Hard", "players": [] }"#).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!(settings.players.is_empty());
        assert_eq!(settings.instance, InstanceConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let mut settings = Settings::default();
        settings.instance.piece_min_size = 80.0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_save_then_load_keeps_changes() {
        let dir = std::env::temp_dir().join(format!("stack-arcade-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        let mut settings = Settings {
            difficulty: Difficulty::Easy,
            ..Settings::default()
        };
        settings.players.truncate(1);
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("stack-arcade-no-such-settings.json");
        let _ = fs::remove_file(&path);
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
