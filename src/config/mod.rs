//! # Configuration
//!
//! Cow Cow reads a single TOML file. Every section has defaults, so a file
//! only needs the values it wants to change.
//!
//! ```toml
//! [game]
//! default_mode = "classic"
//! default_duration_minutes = 30
//! team_name = "Team Moo"
//! trivia_points = 3
//! scavenger_items_per_hunt = 10
//! max_multiplier = 5.0
//! # occasion = "halloween"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "cowcow.log"
//!
//! [[rules]]
//! mode = "classic"
//! name = "Slow start"
//! effect = "add_points"
//! magnitude = 3
//! conditions = [{ kind = { score_below = { threshold = 5 } }, description = "Behind" }]
//! ```
//!
//! ```rust,no_run
//! use cowcow::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("cowcow.toml").await?;
//!     let config = Config::load("cowcow.toml").await?;
//!     println!("Mode: {}", config.game.default_mode);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::game::engine::EngineSettings;
use crate::game::occasion::Occasion;
use crate::game::power_up::DEFAULT_MAX_MULTIPLIER;
use crate::game::rules::{ModeRule, RuleBook};
use crate::game::types::GameMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub default_mode: GameMode,
    /// 0 plays until stopped
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    #[serde(default = "default_team_name")]
    pub team_name: String,
    /// Overrides per-question trivia points
    #[serde(default)]
    pub trivia_points: Option<u32>,
    #[serde(default = "default_scavenger_items")]
    pub scavenger_items_per_hunt: usize,
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: f64,
    /// Pin an occasion instead of using today's date
    #[serde(default)]
    pub occasion: Option<Occasion>,
}

fn default_duration_minutes() -> u32 {
    30
}

fn default_team_name() -> String {
    "Team Moo".to_string()
}

fn default_scavenger_items() -> usize {
    10
}

fn default_max_multiplier() -> f64 {
    DEFAULT_MAX_MULTIPLIER
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_mode: GameMode::Classic,
            default_duration_minutes: default_duration_minutes(),
            team_name: default_team_name(),
            trivia_points: None,
            scavenger_items_per_hunt: default_scavenger_items(),
            max_multiplier: default_max_multiplier(),
            occasion: None,
        }
    }
}

impl GameConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            team_name: self.team_name.clone(),
            max_multiplier: self.max_multiplier,
            trivia_points: self.trivia_points,
            scavenger_items: self.scavenger_items_per_hunt,
            occasion: self.occasion,
        }
    }

    /// Default game length in milliseconds, `None` for untimed games.
    pub fn default_duration_ms(&self) -> Option<i64> {
        match self.default_duration_minutes {
            0 => None,
            minutes => Some(i64::from(minutes) * 60_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    /// Where the sled database lives.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("cowcow")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("cowcow.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extra custom rules, added to the built-in ones for their mode
    #[serde(default)]
    pub rules: Vec<ModeRule>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        if !game.max_multiplier.is_finite() || game.max_multiplier < 1.0 {
            return Err(anyhow!(
                "game.max_multiplier must be at least 1.0 (got {})",
                game.max_multiplier
            ));
        }
        if game.scavenger_items_per_hunt == 0 {
            return Err(anyhow!("game.scavenger_items_per_hunt must be positive"));
        }
        if game.trivia_points == Some(0) {
            return Err(anyhow!("game.trivia_points must be positive when set"));
        }
        if game.team_name.trim().is_empty() {
            return Err(anyhow!("game.team_name cannot be empty"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir cannot be empty"));
        }
        for rule in &self.rules {
            if rule.rule.name.trim().is_empty() {
                return Err(anyhow!("custom rule for {} mode has no name", rule.mode));
            }
            if matches!(rule.rule.duration_ms, Some(ms) if ms <= 0) {
                return Err(anyhow!("custom rule '{}' has a non-positive duration", rule.rule.name));
            }
        }
        Ok(())
    }

    /// Built-in rules plus the configured ones.
    pub fn rule_book(&self) -> RuleBook {
        RuleBook::defaults().with_overrides(&self.rules)
    }
}
