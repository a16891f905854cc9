//! Configuration management for biome
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (BIOME_*)
//! 3. Config file (~/.config/biome/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::biome::BiomeOptions;
use crate::git::EditorOptions;
use crate::{Error, Result};

/// Config edit session settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Program and leading arguments used as the git editor helper.
    /// Unset means this executable's `config-edit-helper` subcommand.
    pub helper_command: Option<Vec<String>>,

    /// Abandon a config edit session after this long, ex. `"30s"`
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Settings applied when a biome is created
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    /// Register new biomes with `git maintenance start`
    pub start_maintenance: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            start_maintenance: true,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub init: InitConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/biome/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("biome").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - BIOME_EDIT_HELPER: editor helper command, split on whitespace
    /// - BIOME_EDIT_TIMEOUT: config edit timeout, ex. `30s`
    /// - BIOME_START_MAINTENANCE: `true` or `false`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(helper) = std::env::var("BIOME_EDIT_HELPER") {
            let command: Vec<String> = helper.split_whitespace().map(str::to_string).collect();
            if !command.is_empty() {
                self.editor.helper_command = Some(command);
            }
        }

        if let Ok(timeout) = std::env::var("BIOME_EDIT_TIMEOUT") {
            match parse_duration(&timeout) {
                Ok(timeout) => self.editor.timeout = Some(timeout),
                Err(e) => warn!(value = %timeout, error = %e, "Ignoring BIOME_EDIT_TIMEOUT"),
            }
        }

        if let Ok(start) = std::env::var("BIOME_START_MAINTENANCE") {
            match start.trim().parse::<bool>() {
                Ok(start) => self.init.start_maintenance = start,
                Err(e) => warn!(value = %start, error = %e, "Ignoring BIOME_START_MAINTENANCE"),
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, edit_timeout: Option<Duration>) -> Self {
        if let Some(timeout) = edit_timeout {
            self.editor.timeout = Some(timeout);
        }
        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(edit_timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(edit_timeout))
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            helper_command: self.editor.helper_command.clone(),
            timeout: self.editor.timeout,
        }
    }

    /// Options for opening or creating a biome under this configuration
    pub fn biome_options(&self) -> BiomeOptions {
        BiomeOptions {
            editor: self.editor_options(),
            start_maintenance: self.init.start_maintenance,
        }
    }
}

/// Parse a human friendly duration such as `90s` or `2m 30s`
pub fn parse_duration(s: &str) -> Result<Duration> {
    humantime_serde::re::humantime::parse_duration(s.trim())
        .map_err(|e| Error::Config(format!("Invalid duration {:?}: {}", s, e)))
}
