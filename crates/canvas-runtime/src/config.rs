use std::time::Duration;

use canvas_core::config::DEFAULT_MAX_CONCURRENT_REQUESTS;
use canvas_core::{Config, ModelList};

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Settings a session runs with, resolved from [`Config`] and the model list.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Model for new root nodes; children inherit their parent's model
    pub default_model: String,
    pub system_message: String,
    /// Worker pool size
    pub max_concurrent_requests: usize,
    pub request_timeout: Option<Duration>,
    pub reader_api_key: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_model: ModelList::default().default_model().to_string(),
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_timeout: None,
            reader_api_key: None,
        }
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config, models: &ModelList) -> Self {
        Self {
            default_model: config
                .model
                .clone()
                .unwrap_or_else(|| models.default_model().to_string()),
            system_message: config
                .system_message
                .clone()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string()),
            max_concurrent_requests: config.max_concurrent_requests.max(1),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            reader_api_key: config.jina_api_key.clone(),
        }
    }
}
