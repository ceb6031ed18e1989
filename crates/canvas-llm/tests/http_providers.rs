//! Providers and the reader against a local mock server

use canvas_core::{ChatMessage, Config};
use canvas_llm::{
    AnthropicProvider, HttpBackend, InferenceBackend, LLMError, LLMProvider, OpenAICompatProvider,
    RemoteReader, WebSearch,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn network_tests_disabled() -> bool {
    std::env::var_os("CODEX_SANDBOX_NETWORK_DISABLED").is_some()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama3:latest",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn anthropic_message(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    })
}

#[tokio::test]
async fn openai_compat_posts_system_then_history() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "stream": false,
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "earlier answer" },
                { "role": "user", "content": "question" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello!")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAICompatProvider::new(mock_server.uri()).with_api_key("sk-test");
    let text = provider
        .complete(
            "You are a helpful assistant.",
            &[ChatMessage::user("earlier answer"), ChatMessage::user("question")],
            Some("gpt-4o"),
        )
        .await
        .unwrap();
    assert_eq!(text, "Hello!");
}

#[tokio::test]
async fn openai_compat_maps_http_failures() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let provider = OpenAICompatProvider::new(mock_server.uri());
    let err = provider
        .complete("", &[ChatMessage::user("hi")], None)
        .await
        .unwrap_err();
    match err {
        LLMError::Api(message) => assert!(message.contains("model not loaded"), "{message}"),
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn anthropic_sends_key_version_and_top_level_system() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-latest",
            "system": "Be brief.",
            "messages": [{ "role": "user", "content": "r0\n\nquestion" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_message("Short answer")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("sk-ant-test").with_base_url(mock_server.uri());
    let text = provider
        .complete(
            "Be brief.",
            &[ChatMessage::user("r0"), ChatMessage::user("question")],
            None,
        )
        .await
        .unwrap();
    assert_eq!(text, "Short answer");
}

#[tokio::test]
async fn anthropic_rejected_key_is_auth_error() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("wrong").with_base_url(mock_server.uri());
    let err = provider.complete("", &[ChatMessage::user("hi")], None).await.unwrap_err();
    assert!(matches!(err, LLMError::Auth(_)), "{err:?}");
}

#[tokio::test]
async fn reader_prefixes_target_and_sends_bearer_key() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/https://example.com/article"))
        .and(header("Authorization", "Bearer jina-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Title: Example\n\nBody text"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reader = RemoteReader::new().with_base_url(mock_server.uri());
    let content = reader
        .fetch("https://example.com/article", Some("jina-key"))
        .await
        .unwrap();
    assert_eq!(content, "Title: Example\n\nBody text");
}

#[tokio::test]
async fn reader_failure_is_reported() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let reader = RemoteReader::new().with_base_url(mock_server.uri());
    let err = reader.fetch("https://example.com", None).await.unwrap_err();
    assert!(matches!(err, LLMError::Api(_)), "{err:?}");
}

#[tokio::test]
async fn http_backend_routes_by_model_id() {
    if network_tests_disabled() {
        return;
    }
    let ollama = MockServer::start().await;
    let anthropic = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "llama3:latest" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("from ollama")))
        .expect(1)
        .mount(&ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "model": "claude-3-haiku-20240307" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_message("from claude")))
        .expect(1)
        .mount(&anthropic)
        .await;

    let backend = HttpBackend::new(Config {
        ollama_api_base: Some(ollama.uri()),
        anthropic_api_base: Some(anthropic.uri()),
        anthropic_api_key: Some("sk-ant".to_string()),
        ..Config::default()
    });
    let messages = [ChatMessage::user("hi")];

    let local = backend.complete("llama3:latest", "sys", &messages).await.unwrap();
    let cloud = backend
        .complete("anthropic/claude-3-haiku-20240307", "sys", &messages)
        .await
        .unwrap();
    assert_eq!(local, "from ollama");
    assert_eq!(cloud, "from claude");
}

#[tokio::test]
async fn http_backend_without_openai_key_fails_before_any_request() {
    let backend = HttpBackend::new(Config::default());
    let err = backend
        .complete("gpt-4o", "sys", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::Auth(_)), "{err:?}");
}

#[tokio::test]
async fn search_queries_instant_answers_as_json() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", "rust borrow checker"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Heading": "Borrow checker",
            "AbstractText": "Enforces ownership rules.",
            "AbstractURL": "https://example.com/borrowck",
            "RelatedTopics": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let search = WebSearch::new().with_base_url(mock_server.uri());
    let markdown = search.search("rust borrow checker").await.unwrap();
    assert_eq!(
        markdown,
        "### Search Results\n\n**Borrow checker**\n\nEnforces ownership rules.\n\nhttps://example.com/borrowck"
    );
}

#[tokio::test]
async fn http_backend_search_uses_configured_endpoint() {
    if network_tests_disabled() {
        return;
    }
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(Config {
        search_api_base: Some(mock_server.uri()),
        ..Config::default()
    });
    let err = backend.search("anything").await.unwrap_err();
    assert!(matches!(err, LLMError::Api(_)), "{err:?}");
}
