use reqwest::Client;

use crate::provider::{LLMError, Result};

pub const READER_API_BASE: &str = "https://r.jina.ai";

/// Fetches a web page as model-ready text through a reader service.
#[derive(Debug, Clone)]
pub struct RemoteReader {
    client: Client,
    base_url: String,
}

impl Default for RemoteReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteReader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: READER_API_BASE.to_string(),
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

    pub fn reader_url(&self, url: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), url)
    }

    pub async fn fetch(&self, url: &str, api_key: Option<&str>) -> Result<String> {
        let mut request = self.client.get(self.reader_url(url));
        if let Some(key) = api_key.filter(|key| !key.is_empty()) {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status == 401 || status == 403 {
            return Err(LLMError::Auth(format!("Reader rejected the API key: HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(LLMError::Api(format!("Reader error for {}: HTTP {}: {}", url, status, text)));
        }
        log::info!("Fetched {} bytes for {}", text.len(), url);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_is_appended_verbatim() {
        let reader = RemoteReader::new();
        assert_eq!(
            reader.reader_url("https://example.com/a?b=c"),
            "https://r.jina.ai/https://example.com/a?b=c"
        );
    }
}
