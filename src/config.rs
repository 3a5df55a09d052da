use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{APP_DIR, DEFAULT_MODEL, ENV_STORAGE};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where API credentials are persisted
    #[serde(default)]
    pub storage: StorageConfig,
    /// Model settings for the chat-completions API
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoragePreference,
}

/// Which settings store to open at startup
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoragePreference {
    /// OS keyring when it works, otherwise the settings file
    #[default]
    Auto,
    /// OS keyring only; fail if it is unavailable
    Keyring,
    /// Plain settings file in the config directory
    File,
}

impl FromStr for StoragePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            other => anyhow::bail!(
                "Unknown storage backend '{}' (expected auto, keyring or file)",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_ai_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_ai_model(),
        }
    }
}

fn default_ai_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(APP_DIR);
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config.toml, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        if let Ok(value) = env::var(ENV_STORAGE) {
            config.storage.backend = value
                .parse()
                .with_context(|| format!("Invalid {} value", ENV_STORAGE))?;
        }

        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        Ok(())
    }
}
