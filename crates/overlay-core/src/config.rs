use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::state::DEFAULT_MAX_MESSAGES;

pub const APP_DIR: &str = "ingame-overlay";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1000;

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub ollama_url: Option<String>,
    pub claude_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// How often the overlay re-checks the game window's position
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some("ollama".to_string()),
            default_model: None,
            ollama_url: None,
            claude_api_key: None,
            openai_api_key: None,
            max_messages: DEFAULT_MAX_MESSAGES,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    /// API key for Claude; the environment wins over the config file
    pub fn claude_key(&self) -> Option<String> {
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .or_else(|| self.claude_api_key.clone())
    }

    pub fn openai_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .or_else(|| self.openai_api_key.clone())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(50))
    }

    /// Directory holding the config file and logs
    pub fn app_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.ollama_url(), DEFAULT_OLLAMA_URL);
        assert_eq!(config.update_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.provider = Some("claude".to_string());
        config.default_model = Some("claude-3-5-haiku-20241022".to_string());
        config.max_messages = 40;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_older_file_without_new_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"provider":"ollama","default_model":"gemma3:latest","claude_api_key":null,"openai_api_key":null}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_model.as_deref(), Some("gemma3:latest"));
        assert_eq!(config.max_messages, DEFAULT_MAX_MESSAGES);
        assert_eq!(config.update_interval_ms, DEFAULT_UPDATE_INTERVAL_MS);
        assert!(config.ollama_url.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
