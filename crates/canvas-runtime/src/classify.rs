use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+").ok()
});

/// How a node's prompt is turned into a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStrategy {
    /// Ancestor history plus the prompt
    Conversation,
    /// Fetch the page through the remote reader, then have the model summarise it
    RemoteSummary { url: String },
    /// Web search; the results themselves become the response. Chosen explicitly, never
    /// by [`RequestStrategy::classify`].
    Search { query: String },
}

impl RequestStrategy {
    /// Prompts that start with an http(s) URL are summaries of that page; the whole trimmed
    /// prompt is handed to the reader.
    pub fn classify(prompt: &str) -> Self {
        let prompt = prompt.trim();
        let is_url = URL_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(prompt));
        if is_url {
            RequestStrategy::RemoteSummary {
                url: prompt.to_string(),
            }
        } else {
            RequestStrategy::Conversation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_remote_summaries() {
        for prompt in [
            "https://example.com",
            "http://example.com/a/b?c=d&e=%20",
            "  https://docs.rs/tokio/latest/tokio/  ",
        ] {
            assert_eq!(
                RequestStrategy::classify(prompt),
                RequestStrategy::RemoteSummary {
                    url: prompt.trim().to_string()
                },
                "{prompt}"
            );
        }
    }

    #[test]
    fn only_leading_urls_count() {
        assert_eq!(
            RequestStrategy::classify("summarize https://example.com"),
            RequestStrategy::Conversation
        );
        assert_eq!(RequestStrategy::classify("ftp://example.com"), RequestStrategy::Conversation);
        assert_eq!(RequestStrategy::classify("https://"), RequestStrategy::Conversation);
    }

    #[test]
    fn match_needs_only_a_url_prefix() {
        assert!(matches!(
            RequestStrategy::classify("https://example.com and tell me more"),
            RequestStrategy::RemoteSummary { .. }
        ));
    }
}
