//! Configuration type definitions for Scriba
//!
//! All configuration structs are serde-deserializable from the JSON config
//! file, with `Default` implementations that make every section optional.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Agent loop defaults (model, token budget, round ceiling)
    pub agent: AgentDefaults,
    /// Completion provider credentials and endpoint overrides
    pub provider: ProviderConfig,
    /// Per-tool settings
    pub tools: ToolsConfig,
}

/// Defaults for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    /// Model identifier sent to the completion API
    pub model: String,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Ceiling on model/tool alternations within one user request
    pub max_tool_rounds: usize,
    /// Optional system prompt override
    pub system_prompt: Option<String>,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            temperature: 1.0,
            max_tool_rounds: 10,
            system_prompt: None,
        }
    }
}

/// Completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Anthropic API key; falls back to `ANTHROPIC_API_KEY`
    pub api_key: Option<String>,
    /// API base URL override (proxies, test servers)
    pub api_base: Option<String>,
    /// Retry attempts for transient provider errors
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            max_retries: 3,
        }
    }
}

/// Per-tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolsConfig {
    pub weather: WeatherConfig,
    pub web: WebConfig,
    pub notes: NotesConfig,
}

/// Weather tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeatherConfig {
    /// WeatherAPI.com key; falls back to `WEATHER_API_KEY`. Without a key
    /// the tool serves clearly marked simulated data.
    pub api_key: Option<String>,
}

/// Webpage reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Maximum extracted characters returned to the model
    pub max_chars: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { max_chars: 8_000 }
    }
}

/// Note store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotesConfig {
    /// Path of the notes file; defaults to `~/.scriba/notes.json`
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.agent.model, "claude-sonnet-4-20250514");
        assert_eq!(config.agent.max_tokens, 4096);
        assert_eq!(config.agent.max_tool_rounds, 10);
        assert!(config.agent.system_prompt.is_none());
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.max_retries, 3);
        assert_eq!(config.tools.web.max_chars, 8_000);
        assert!(config.tools.notes.path.is_none());
    }

    #[test]
    fn test_partial_config_deserializes() {
        let json = r#"{"agent": {"model": "claude-opus-4-20250514"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent.model, "claude-opus-4-20250514");
        // Unspecified sections fall back to defaults
        assert_eq!(config.agent.max_tool_rounds, 10);
        assert_eq!(config.tools.web.max_chars, 8_000);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-ant-test".to_string());
        config.tools.weather.api_key = Some("wkey".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.provider.api_key.as_deref(), Some("sk-ant-test"));
        assert_eq!(parsed.tools.weather.api_key.as_deref(), Some("wkey"));
    }
}
