//! Conversation context for a node
//!
//! The history sent to the model is the node's root-to-parent path, one `user` message per
//! answered ancestor, followed by the node's attached files and finally its prompt.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::NodeId;
use crate::tree::Canvas;

/// Instruction appended when asking a model for follow-up questions
pub const FOLLOW_UP_PROMPT: &str = "Based on the conversation above,\
please generate 3 follow-up questions.\
Keep them concise and relevant to the topic.\
Just list the 3 questions without any other text.\
Do not prefix the questions with a number.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub struct ContextAssembler;

impl ContextAssembler {
    /// Messages for submitting `node`'s prompt.
    ///
    /// Ancestor responses are sent with the `user` role, matching how the canvas has always
    /// replayed history to models. Attached files that cannot be read are skipped.
    pub fn build_context(canvas: &Canvas, node: NodeId) -> Result<Vec<ChatMessage>> {
        let mut messages = Self::ancestor_responses(canvas, node)?;
        let target = canvas.get(node)?;

        for path in &target.attached_file_paths {
            match std::fs::read_to_string(path) {
                Ok(content) => messages.push(ChatMessage::user(format!("{}\n{}", path, content))),
                Err(e) => log::warn!("Skipping attached file {}: {}", path, e),
            }
        }

        messages.push(ChatMessage::user(target.prompt.trim()));
        log::debug!("Assembled {} message(s) for node {}", messages.len(), node);
        Ok(messages)
    }

    /// Messages asking the model for follow-up questions about the conversation ending at
    /// `node`, its own response included.
    pub fn build_follow_up_context(canvas: &Canvas, node: NodeId) -> Result<Vec<ChatMessage>> {
        let mut messages = Self::ancestor_responses(canvas, node)?;
        let response = &canvas.get(node)?.response_markdown;
        if !response.is_empty() {
            messages.push(ChatMessage::user(response.as_str()));
        }
        messages.push(ChatMessage::user(FOLLOW_UP_PROMPT));
        Ok(messages)
    }

    fn ancestor_responses(canvas: &Canvas, node: NodeId) -> Result<Vec<ChatMessage>> {
        let mut messages = Vec::new();
        for ancestor in canvas.ancestor_chain_top_down(node)? {
            let response = &canvas.get(ancestor)?.response_markdown;
            if !response.is_empty() {
                messages.push(ChatMessage::user(response.as_str()));
            }
        }
        Ok(messages)
    }
}
