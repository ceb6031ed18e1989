use async_trait::async_trait;
use canvas_core::{ChatMessage, Config};
use reqwest::Client;

use crate::provider::{LLMProvider, Result};
use crate::providers::{AnthropicProvider, OpenAICompatProvider};
use crate::reader::RemoteReader;
use crate::resolver::{resolve_model, ProviderKind};
use crate::search::WebSearch;

/// Everything the inference coordinator needs from the outside world.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        system_message: &str,
        messages: &[ChatMessage],
    ) -> Result<String>;

    async fn fetch_remote_content(&self, url: &str, api_key: Option<&str>) -> Result<String>;

    /// Web search, returned as markdown ready to show as a response
    async fn search(&self, query: &str) -> Result<String>;
}

/// Backend that resolves each model id to an HTTP provider.
pub struct HttpBackend {
    config: Config,
    client: Client,
    reader: RemoteReader,
    web_search: WebSearch,
}

impl HttpBackend {
    pub fn new(config: Config) -> Self {
        let client = Client::new();
        let mut reader = RemoteReader::new().with_client(client.clone());
        if let Some(base) = &config.reader_api_base {
            reader = reader.with_base_url(base.clone());
        }
        let mut web_search = WebSearch::new().with_client(client.clone());
        if let Some(base) = &config.search_api_base {
            web_search = web_search.with_base_url(base.clone());
        }
        Self {
            config,
            client,
            reader,
            web_search,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn provider_for(&self, model_id: &str) -> Result<(Box<dyn LLMProvider>, String)> {
        let resolved = resolve_model(model_id, &self.config)?;
        let provider: Box<dyn LLMProvider> = match resolved.kind {
            ProviderKind::Ollama | ProviderKind::OpenAi => {
                let mut provider = OpenAICompatProvider::new(resolved.base_url)
                    .with_client(self.client.clone())
                    .with_model(resolved.model.clone());
                if let Some(key) = resolved.api_key {
                    provider = provider.with_api_key(key);
                }
                Box::new(provider)
            }
            ProviderKind::Anthropic => Box::new(
                AnthropicProvider::new(resolved.api_key.unwrap_or_default())
                    .with_client(self.client.clone())
                    .with_base_url(resolved.base_url)
                    .with_model(resolved.model.clone()),
            ),
        };
        Ok((provider, resolved.model))
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn complete(
        &self,
        model_id: &str,
        system_message: &str,
        messages: &[ChatMessage],
    ) -> Result<String> {
        let (provider, model) = self.provider_for(model_id)?;
        provider.complete(system_message, messages, Some(&model)).await
    }

    async fn fetch_remote_content(&self, url: &str, api_key: Option<&str>) -> Result<String> {
        self.reader.fetch(url, api_key).await
    }

    async fn search(&self, query: &str) -> Result<String> {
        self.web_search.search(query).await
    }
}
