//! Configuration for the bot process.
//!
//! A single TOML file at `~/.ensemble-bot/config.toml`.
//!
//! # Priority
//!
//! 1. Environment variables (`ENSEMBLE_*` prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ENSEMBLE_BOT_TOKEN` → telegram.bot_token
//! - `ENSEMBLE_LANGUAGE` → language
//! - `ENSEMBLE_LOG_LEVEL` → log_level

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".ensemble-bot"),
        |dirs| dirs.home_dir().join(".ensemble-bot"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language tag for outbound messages ("en" or "ro").
    #[serde(default = "default_language")]
    pub language: String,

    /// Base log level for business logs.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub planner: PlannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            log_level: default_log_level(),
            telegram: TelegramConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: String,

    /// Usernames or numeric user IDs allowed to talk to the bot.
    /// `"*"` allows everyone.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            allowed_users: default_allowed_users(),
        }
    }
}

/// Planner presets offered as buttons during the event wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Location choices offered as buttons.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Time-of-day choices offered as buttons (24h HH:MM).
    #[serde(default = "default_time_presets")]
    pub time_presets: Vec<String>,

    /// How many upcoming Sundays to offer as date buttons.
    #[serde(default = "default_date_options")]
    pub date_options: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            time_presets: default_time_presets(),
            date_options: default_date_options(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}

fn default_locations() -> Vec<String> {
    vec!["Main Hall".into()]
}

fn default_time_presets() -> Vec<String> {
    vec!["09:00".into(), "10:30".into(), "18:00".into()]
}

fn default_date_options() -> usize {
    3
}

impl Config {
    /// Load configuration from the default path, or an explicit override.
    ///
    /// A missing file yields defaults; env vars are applied afterwards.
    pub fn load(path_override: Option<&str>) -> Result<Self> {
        let path = match path_override {
            Some(p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
            None => config_path(),
        };

        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply `ENSEMBLE_*` environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("ENSEMBLE_BOT_TOKEN") {
            if !token.is_empty() {
                self.telegram.bot_token = token;
            }
        }
        if let Ok(lang) = std::env::var("ENSEMBLE_LANGUAGE") {
            if !lang.is_empty() {
                self.language = lang;
            }
        }
        if let Ok(level) = std::env::var("ENSEMBLE_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.language, "en");
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.language, "en");
        assert_eq!(parsed.telegram.allowed_users, vec!["*".to_string()]);
        assert_eq!(parsed.planner.time_presets.len(), 3);
        assert_eq!(parsed.planner.date_options, 3);
    }

    #[test]
    fn parse_partial_config() {
        let raw = r#"
language = "ro"

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice"]
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.language, "ro");
        assert_eq!(config.telegram.bot_token, "123:ABC");
        assert_eq!(config.telegram.allowed_users, vec!["alice".to_string()]);
        // Untouched section falls back to defaults
        assert_eq!(config.planner.locations, vec!["Main Hall".to_string()]);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.log_level, "info");
    }
}
