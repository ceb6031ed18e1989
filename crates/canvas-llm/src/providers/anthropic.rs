//! Anthropic Messages API provider.

use async_trait::async_trait;
use canvas_core::ChatMessage;
use reqwest::{header::HeaderMap, Client};

use crate::protocol::{build_anthropic_request, parse_anthropic_response};
use crate::provider::{LLMError, LLMProvider, Result};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_BASE.to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            max_tokens: 4096,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        use reqwest::header::{HeaderValue, CONTENT_TYPE};

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| LLMError::Auth(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn complete(
        &self,
        system_message: &str,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<String> {
        let model_to_use = model.unwrap_or(&self.model);
        let body = build_anthropic_request(model_to_use, self.max_tokens, system_message, messages);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/messages", self.base_url.trim_end_matches('/')))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(LLMError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(LLMError::Http)?;
        if status == 401 || status == 403 {
            return Err(LLMError::Auth(format!(
                "Anthropic authentication failed: {}. Please check your API key.",
                text
            )));
        }
        if !status.is_success() {
            return Err(LLMError::Api(format!(
                "Anthropic API error: HTTP {}: {}",
                status, text
            )));
        }

        Ok(parse_anthropic_response(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_key_and_version() {
        let headers = AnthropicProvider::new("sk-ant-test").build_headers().unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant-test");
        assert_eq!(headers["anthropic-version"], "2023-06-01");
    }

    #[test]
    fn invalid_key_is_an_auth_error() {
        let result = AnthropicProvider::new("bad\nkey").build_headers();
        assert!(matches!(result, Err(LLMError::Auth(_))));
    }

    #[test]
    fn builders_override_defaults() {
        let provider = AnthropicProvider::new("k")
            .with_base_url("http://proxy.local/v1")
            .with_model("claude-3-haiku-20240307")
            .with_max_tokens(512);
        assert_eq!(provider.base_url, "http://proxy.local/v1");
        assert_eq!(provider.model, "claude-3-haiku-20240307");
        assert_eq!(provider.max_tokens, 512);
    }
}
