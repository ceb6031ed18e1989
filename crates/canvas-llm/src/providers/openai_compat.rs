use async_trait::async_trait;
use canvas_core::ChatMessage;
use reqwest::Client;

use crate::protocol::{build_openai_request, parse_openai_response};
use crate::provider::{LLMError, LLMProvider, Result};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Local Ollama server, through its OpenAI-compatible endpoint
pub const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

/// Any `/chat/completions` endpoint: OpenAI itself or a local Ollama server.
pub struct OpenAICompatProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAICompatProvider {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(OPENAI_API_BASE).with_api_key(api_key)
    }

    pub fn ollama() -> Self {
        Self::new(OLLAMA_API_BASE)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: None,
            base_url: base_url.into(),
            model: "llama3:latest".to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
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

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatProvider {
    async fn complete(
        &self,
        system_message: &str,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<String> {
        let model_to_use = model.unwrap_or(&self.model);
        let body = build_openai_request(model_to_use, system_message, messages);
        log::debug!(
            "POST {} model='{}' messages={}",
            self.endpoint(),
            model_to_use,
            body.messages.len()
        );

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if status == 401 || status == 403 {
            return Err(LLMError::Auth(format!("HTTP {}: {}", status, text)));
        }
        if !status.is_success() {
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        Ok(parse_openai_response(&text)?)
    }
}
