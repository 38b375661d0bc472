//! Configuration management for Scriba
//!
//! Configuration is loaded from `~/.scriba/config.json` with environment
//! variable overrides. Every section is optional; a missing file yields the
//! defaults, so the binary runs with nothing but `ANTHROPIC_API_KEY` set.

mod types;

pub use types::*;

use crate::error::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Returns the Scriba configuration directory path (`~/.scriba`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scriba")
    }

    /// Returns the path to the config file (`~/.scriba/config.json`).
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Scriba-specific variables follow the pattern `SCRIBA_SECTION_KEY`;
    /// the conventional `ANTHROPIC_API_KEY` and `WEATHER_API_KEY` names are
    /// honored as fallbacks when the config file carries no key.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCRIBA_AGENT_MODEL") {
            self.agent.model = val;
        }
        if let Ok(val) = std::env::var("SCRIBA_AGENT_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                self.agent.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("SCRIBA_AGENT_MAX_TOOL_ROUNDS") {
            if let Ok(v) = val.parse() {
                self.agent.max_tool_rounds = v;
            }
        }
        if let Ok(val) = std::env::var("SCRIBA_PROVIDER_API_KEY") {
            self.provider.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SCRIBA_PROVIDER_API_BASE") {
            self.provider.api_base = Some(val);
        }

        // Conventional key names, lowest precedence
        if self.provider.api_key.is_none() {
            if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
                self.provider.api_key = Some(val);
            }
        }
        if self.tools.weather.api_key.is_none() {
            if let Ok(val) = std::env::var("WEATHER_API_KEY") {
                self.tools.weather.api_key = Some(val);
            }
        }
    }

    /// Resolved path of the notes file.
    pub fn notes_path(&self) -> PathBuf {
        self.tools
            .notes
            .path
            .clone()
            .unwrap_or_else(|| Self::dir().join("notes.json"))
    }
}
