use canvas_core::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

use super::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Build a Messages API body.
///
/// The system message moves to the top-level `system` field. Consecutive messages with the
/// same role are merged because the canvas replays every ancestor answer as a user turn.
pub fn build_anthropic_request(
    model: &str,
    max_tokens: u32,
    system_message: &str,
    messages: &[ChatMessage],
) -> AnthropicRequest {
    let mut system_parts: Vec<&str> = Vec::new();
    if !system_message.is_empty() {
        system_parts.push(system_message);
    }

    let mut merged: Vec<ChatMessage> = Vec::new();
    for message in messages {
        if message.role == Role::System {
            system_parts.push(&message.content);
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => merged.push(message.clone()),
        }
    }

    AnthropicRequest {
        model: model.to_string(),
        max_tokens,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        messages: merged,
    }
}

/// Text blocks of the response, concatenated
pub fn parse_anthropic_response(body: &str) -> ProtocolResult<String> {
    let response: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| ProtocolError::InvalidContent(format!("Unexpected messages body: {}", e)))?;

    let texts: Vec<String> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect();
    if texts.is_empty() {
        return Err(ProtocolError::MissingField("content[].text".to_string()));
    }
    Ok(texts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_goes_top_level_and_user_turns_merge() {
        let request = build_anthropic_request(
            "claude-3-5-sonnet-latest",
            4096,
            "You are a helpful assistant.",
            &[
                ChatMessage::user("r0"),
                ChatMessage::user("r1"),
                ChatMessage::assistant("draft"),
                ChatMessage::user("question"),
            ],
        );

        assert_eq!(request.system.as_deref(), Some("You are a helpful assistant."));
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::user("r0\n\nr1"),
                ChatMessage::assistant("draft"),
                ChatMessage::user("question"),
            ]
        );
    }

    #[test]
    fn no_system_field_without_system_text() {
        let request = build_anthropic_request("m", 16, "", &[ChatMessage::user("hi")]);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("system").is_none());
        assert_eq!(body["max_tokens"], 16);
    }

    #[test]
    fn text_blocks_are_concatenated() {
        let body = r#"{"id":"msg_1","type":"message","content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"t","name":"n","input":{}},{"type":"text","text":" world"}]}"#;
        assert_eq!(parse_anthropic_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn response_without_text_is_rejected() {
        assert!(matches!(
            parse_anthropic_response(r#"{"content":[]}"#),
            Err(ProtocolError::MissingField(_))
        ));
    }
}
