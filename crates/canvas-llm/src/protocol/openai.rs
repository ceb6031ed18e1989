use canvas_core::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

use super::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The system message leads the conversation; an empty one is left out.
pub fn build_openai_request(model: &str, system_message: &str, messages: &[ChatMessage]) -> OpenAIRequest {
    let mut all = Vec::with_capacity(messages.len() + 1);
    if !system_message.is_empty() {
        all.push(ChatMessage {
            role: Role::System,
            content: system_message.to_string(),
        });
    }
    all.extend(messages.iter().cloned());

    OpenAIRequest {
        model: model.to_string(),
        messages: all,
        stream: false,
    }
}

/// Text of `choices[0].message.content`
pub fn parse_openai_response(body: &str) -> ProtocolResult<String> {
    let response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| ProtocolError::InvalidContent(format!("Unexpected completion body: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProtocolError::MissingField("choices".to_string()))?
        .message
        .content
        .ok_or_else(|| ProtocolError::MissingField("choices[0].message.content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_comes_first() {
        let request = build_openai_request(
            "llama3:latest",
            "You are a helpful assistant.",
            &[ChatMessage::user("r0"), ChatMessage::user("question")],
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "llama3:latest");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][2]["content"], "question");
    }

    #[test]
    fn empty_system_message_is_dropped() {
        let request = build_openai_request("m", "", &[ChatMessage::user("hi")]);
        assert_eq!(request.messages, vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello!"}},{"index":1,"message":{"role":"assistant","content":"ignored"}}]}"#;
        assert_eq!(parse_openai_response(body).unwrap(), "Hello!");
    }

    #[test]
    fn missing_choices_is_a_protocol_error() {
        assert!(matches!(
            parse_openai_response(r#"{"choices":[]}"#),
            Err(ProtocolError::MissingField(_))
        ));
        assert!(matches!(
            parse_openai_response("not json"),
            Err(ProtocolError::InvalidContent(_))
        ));
    }
}
