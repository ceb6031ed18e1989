//! Model id → provider routing
//!
//! An explicit `ollama/`, `openai/` or `anthropic/` prefix always wins. Bare ids are routed by
//! family name, and anything unrecognised is assumed to be served by the local Ollama
//! instance, which is where the canvas' default model list points.

use canvas_core::Config;

use crate::provider::{LLMError, Result};
use crate::providers::anthropic::ANTHROPIC_API_BASE;
use crate::providers::openai_compat::{OLLAMA_API_BASE, OPENAI_API_BASE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "ollama" => Some(ProviderKind::Ollama),
            "openai" => Some(ProviderKind::OpenAi),
            "anthropic" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }

    fn infer(model: &str) -> Self {
        if model.starts_with("gpt-") || model.starts_with("o1") || model.starts_with("o3") {
            ProviderKind::OpenAi
        } else if model.starts_with("claude-") {
            ProviderKind::Anthropic
        } else {
            ProviderKind::Ollama
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub kind: ProviderKind,
    /// Model name as the provider knows it, prefix stripped
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

pub fn resolve_model(model_id: &str, config: &Config) -> Result<ResolvedModel> {
    let model_id = model_id.trim();
    let (kind, model) = match model_id.split_once('/') {
        Some((prefix, rest)) => match ProviderKind::from_prefix(prefix) {
            Some(kind) => (kind, rest),
            None => (ProviderKind::infer(model_id), model_id),
        },
        None => (ProviderKind::infer(model_id), model_id),
    };
    if model.is_empty() {
        return Err(LLMError::Api(format!("Invalid model id '{}'", model_id)));
    }

    let resolved = match kind {
        ProviderKind::Ollama => ResolvedModel {
            kind,
            model: model.to_string(),
            base_url: config
                .ollama_api_base
                .clone()
                .unwrap_or_else(|| OLLAMA_API_BASE.to_string()),
            api_key: None,
        },
        ProviderKind::OpenAi => ResolvedModel {
            kind,
            model: model.to_string(),
            base_url: config
                .openai_api_base
                .clone()
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            api_key: Some(required_key(&config.openai_api_key, "OPENAI_API_KEY", model_id)?),
        },
        ProviderKind::Anthropic => ResolvedModel {
            kind,
            model: model.to_string(),
            base_url: config
                .anthropic_api_base
                .clone()
                .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string()),
            api_key: Some(required_key(&config.anthropic_api_key, "ANTHROPIC_API_KEY", model_id)?),
        },
    };
    log::debug!("Model '{}' resolved to {:?} at {}", model_id, resolved.kind, resolved.base_url);
    Ok(resolved)
}

fn required_key(key: &Option<String>, variable: &str, model_id: &str) -> Result<String> {
    key.clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LLMError::Auth(format!("{} is not set (needed for model '{}')", variable, model_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> Config {
        Config {
            openai_api_key: Some("sk-openai".to_string()),
            anthropic_api_key: Some("sk-ant".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn routing_table() {
        let config = keyed();
        let cases = [
            ("llama3:latest", ProviderKind::Ollama, "llama3:latest"),
            ("mistral:latest", ProviderKind::Ollama, "mistral:latest"),
            ("gpt-4o", ProviderKind::OpenAi, "gpt-4o"),
            ("o1-mini", ProviderKind::OpenAi, "o1-mini"),
            ("o3-mini", ProviderKind::OpenAi, "o3-mini"),
            ("claude-3-5-sonnet-latest", ProviderKind::Anthropic, "claude-3-5-sonnet-latest"),
            ("ollama/gpt-oss:20b", ProviderKind::Ollama, "gpt-oss:20b"),
            ("openai/my-finetune", ProviderKind::OpenAi, "my-finetune"),
            ("anthropic/claude-3-haiku-20240307", ProviderKind::Anthropic, "claude-3-haiku-20240307"),
            ("library/qwen2:7b", ProviderKind::Ollama, "library/qwen2:7b"),
        ];
        for (id, kind, model) in cases {
            let resolved = resolve_model(id, &config).unwrap();
            assert_eq!(resolved.kind, kind, "{id}");
            assert_eq!(resolved.model, model, "{id}");
        }
    }

    #[test]
    fn ollama_uses_local_endpoint_without_key() {
        let resolved = resolve_model("llama3:latest", &Config::default()).unwrap();
        assert_eq!(resolved.base_url, "http://localhost:11434/v1");
        assert_eq!(resolved.api_key, None);
    }

    #[test]
    fn configured_bases_override_defaults() {
        let config = Config {
            ollama_api_base: Some("http://gpu-box:11434/v1".to_string()),
            anthropic_api_base: Some("http://proxy/v1".to_string()),
            ..keyed()
        };
        assert_eq!(resolve_model("llama3", &config).unwrap().base_url, "http://gpu-box:11434/v1");
        assert_eq!(resolve_model("claude-3-opus", &config).unwrap().base_url, "http://proxy/v1");
    }

    #[test]
    fn missing_cloud_keys_are_auth_errors() {
        let config = Config::default();
        assert!(matches!(resolve_model("gpt-4o", &config), Err(LLMError::Auth(_))));
        assert!(matches!(resolve_model("anthropic/claude-x", &config), Err(LLMError::Auth(_))));
    }

    #[test]
    fn empty_model_after_prefix_is_rejected() {
        assert!(matches!(resolve_model("ollama/", &keyed()), Err(LLMError::Api(_))));
    }
}
