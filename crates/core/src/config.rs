use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capture::tracker::DEFAULT_POLL_INTERVAL;
use crate::playback::countdown::PLAYBACK_OVERLAY_SECS;

/// Hardcoded fallback when nothing else supplies a base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Environment variable consulted between the CLI flag and the config file.
pub const API_URL_ENV_VAR: &str = "COSMOS_API_URL";

/// Persisted console settings. Stored in config.json in the working
/// directory by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub language: String,
    pub photo_poll_interval_secs: u64,
    pub countdown_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            language: "en".to_string(),
            photo_poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            countdown_secs: PLAYBACK_OVERLAY_SECS,
        }
    }
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// If no path is provided, defaults to 'config.json' in the current
    /// working directory.
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));
        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from the configuration file, creating it with defaults
    /// if it does not exist yet.
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;
        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "config file version {} doesn't match application version {}; using defaults for new settings",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Save current settings to the configuration file.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            modified_at: chrono::Utc::now().to_rfc3339(),
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(&self.config_path, content).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Resolve the base URL from the CLI flag, the `COSMOS_API_URL`
    /// environment variable, and the loaded settings, in that order.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> String {
        resolve_base_url(flag, std::env::var(API_URL_ENV_VAR).ok().as_deref(), &self.settings)
    }
}

/// Precedence: explicit flag > environment > config file (whose default is
/// the hardcoded fallback).
pub fn resolve_base_url(flag: Option<&str>, env: Option<&str>, settings: &Settings) -> String {
    flag.or(env)
        .map(|s| s.to_string())
        .unwrap_or_else(|| settings.api_base_url.clone())
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    ReadError(String),
    WriteError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "Failed to read config file: {}", msg),
            ConfigError::WriteError(msg) => write!(f, "Failed to write config file: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config file: {}", msg),
            ConfigError::SerializeError(msg) => write!(f, "Failed to serialize config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
