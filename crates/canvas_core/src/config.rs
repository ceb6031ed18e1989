use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

const CONFIG_FILE_PATH: &str = "config.toml";

fn default_max_concurrent_requests() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model for new nodes; the first entry of models.conf when unset
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub ollama_api_base: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_base: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_base: Option<String>,
    /// Key for the remote reader used by URL prompts
    #[serde(default)]
    pub jina_api_key: Option<String>,
    #[serde(default)]
    pub reader_api_base: Option<String>,
    /// Web search endpoint used by search prompts
    #[serde(default)]
    pub search_api_base: Option<String>,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// No timeout when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            ollama_api_base: None,
            openai_api_key: None,
            openai_api_base: None,
            anthropic_api_key: None,
            anthropic_api_base: None,
            jina_api_key: None,
            reader_api_base: None,
            search_api_base: None,
            system_message: None,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load ~/.chat-canvas/config.json, falling back to ./config.toml, then apply
    /// environment overrides. Unreadable files are logged and ignored.
    pub fn new() -> Self {
        let mut config = match Self::from_files(&paths::config_json_path(), Path::new(CONFIG_FILE_PATH)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring configuration file: {}", e);
                Config::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// The JSON file wins when it exists; the TOML file is only read otherwise.
    pub fn from_files(json_path: &Path, toml_path: &Path) -> Result<Self, ConfigError> {
        if json_path.exists() {
            let content = std::fs::read_to_string(json_path)?;
            return Ok(serde_json::from_str(&content)?);
        }
        if toml_path.exists() {
            let content = std::fs::read_to_string(toml_path)?;
            return Ok(toml::from_str(&content)?);
        }
        Ok(Config::default())
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings = [
            ("CHAT_CANVAS_MODEL", &mut self.model),
            ("OLLAMA_API_BASE", &mut self.ollama_api_base),
            ("OPENAI_API_KEY", &mut self.openai_api_key),
            ("OPENAI_API_BASE", &mut self.openai_api_base),
            ("ANTHROPIC_API_KEY", &mut self.anthropic_api_key),
            ("ANTHROPIC_API_BASE", &mut self.anthropic_api_base),
            ("JINA_API_KEY", &mut self.jina_api_key),
            ("CHAT_CANVAS_SEARCH_API_BASE", &mut self.search_api_base),
        ];
        for (key, slot) in strings {
            if let Some(value) = lookup(key).filter(|value| !value.trim().is_empty()) {
                *slot = Some(value);
            }
        }

        if let Some(value) = lookup("CHAT_CANVAS_MAX_CONCURRENT") {
            match value.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => self.max_concurrent_requests = limit,
                _ => log::warn!("Ignoring CHAT_CANVAS_MAX_CONCURRENT={:?}", value),
            }
        }
        if let Some(value) = lookup("CHAT_CANVAS_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(0) => self.request_timeout_secs = None,
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => log::warn!("Ignoring CHAT_CANVAS_TIMEOUT_SECS={:?}", value),
            }
        }
    }
}
