use reqwest::Client;
use serde::Deserialize;

use crate::provider::{LLMError, Result};

pub const SEARCH_API_BASE: &str = "https://api.duckduckgo.com";

pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub href: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

/// DuckDuckGo instant-answer search, rendered as markdown for a node's response.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    base_url: String,
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearch {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: SEARCH_API_BASE.to_string(),
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

    pub async fn search(&self, query: &str) -> Result<String> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LLMError::Api(format!("Search failed for '{}': HTTP {}: {}", query, status, text)));
        }

        let results = parse_search_response(&text)?;
        log::info!("Search for '{}' returned {} result(s)", query, results.len());
        Ok(format_results(&results))
    }
}

/// Abstract first, then related topics (groups flattened), at most [`MAX_SEARCH_RESULTS`].
pub fn parse_search_response(body: &str) -> Result<Vec<SearchResult>> {
    let answer: InstantAnswer = serde_json::from_str(body)?;
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        results.push(SearchResult {
            title: answer.heading.clone(),
            body: answer.abstract_text.clone(),
            href: answer.abstract_url.clone(),
        });
    }

    let mut pending: Vec<&RelatedTopic> = answer.related_topics.iter().rev().collect();
    while let Some(topic) = pending.pop() {
        if results.len() >= MAX_SEARCH_RESULTS {
            break;
        }
        match topic {
            RelatedTopic::Topic { text, first_url } => {
                let title = text.split(" - ").next().unwrap_or(text.as_str()).to_string();
                results.push(SearchResult {
                    title,
                    body: text.clone(),
                    href: first_url.clone(),
                });
            }
            RelatedTopic::Group { topics } => pending.extend(topics.iter().rev()),
        }
    }

    results.truncate(MAX_SEARCH_RESULTS);
    Ok(results)
}

pub fn format_results(results: &[SearchResult]) -> String {
    let entries: Vec<String> = results
        .iter()
        .map(|result| format!("**{}**\n\n{}\n\n{}", result.title, result.body, result.href))
        .collect();
    format!("### Search Results\n\n{}", entries.join("\n\n"))
}
