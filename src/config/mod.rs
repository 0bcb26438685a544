//! Configuration management.
//!
//! Wildgrove reads a TOML config file for operational settings and takes
//! secrets from the environment: the chat-bot credential comes from
//! `WILDGROVE_BOT_TOKEN` (fatal if missing at start), and the store
//! location may be overridden with `WILDGROVE_DATA_DIR`. Precedence is
//! environment > config file > defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Environment variable holding the chat transport credential.
pub const BOT_TOKEN_ENV: &str = "WILDGROVE_BOT_TOKEN";
/// Environment variable overriding the store directory.
pub const DATA_DIR_ENV: &str = "WILDGROVE_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Display name for this world, used in greetings.
    #[serde(default = "default_world_name")]
    pub world_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_name: default_world_name(),
        }
    }
}

fn default_world_name() -> String {
    "Wildgrove".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data/wildgrove".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: error, warn, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a starter configuration file (used by `wildgrove init`).
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).context("failed to serialize default config")?;
        fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write config file: {path}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "invalid logging.level '{}' (expected one of {:?})",
                self.logging.level,
                LEVELS
            ));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.game.world_name.trim().is_empty() {
            return Err(anyhow!("game.world_name must not be empty"));
        }
        Ok(())
    }

    /// The chat-bot credential. Absence is a fatal startup error.
    pub fn bot_token(&self) -> Result<String> {
        match std::env::var(BOT_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(anyhow!(
                "{BOT_TOKEN_ENV} is required; set it in the environment"
            )),
        }
    }

    /// Store directory, with the environment override applied.
    pub fn data_dir(&self) -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(&self.storage.data_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.data_dir, "data/wildgrove");
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.data_dir, "data/wildgrove");
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let config: Config = toml::from_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.game.world_name, "Wildgrove");
    }
}
