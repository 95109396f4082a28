//! Core configuration types.

use super::cooldown::CooldownConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "config_io",
            Self::Parse(_) => "config_parse",
        }
    }
}

/// Engine configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Prefixes, case policy and ownership.
    #[serde(default)]
    pub client: ClientConfig,
    /// Cooldown bucket housekeeping.
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// How the client recognises and routes commands.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Invocation prefixes. The longest matching prefix wins.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    /// Match top-level command names and aliases case-insensitively.
    #[serde(default)]
    pub case_insensitive: bool,
    /// Drop messages authored by bots before prefix matching (default: true).
    #[serde(default = "default_true")]
    pub ignore_bots: bool,
    /// Register the built-in `help` command (default: true).
    #[serde(default = "default_true")]
    pub help_command: bool,
    /// User ids allowed through the `is_bot_owner` check.
    #[serde(default)]
    pub owner_ids: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            case_insensitive: false,
            ignore_bots: true,
            help_command: true,
            owner_ids: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Prefixes ordered longest first, so `!!` is tried before `!`.
    pub fn sorted_prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self
            .prefixes
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
        prefixes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_prefixes() -> Vec<String> {
    vec!["!".to_string()]
}

pub(super) fn default_true() -> bool {
    true
}
