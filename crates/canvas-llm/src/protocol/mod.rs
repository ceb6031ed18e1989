//! Wire shapes of the chat-completion APIs the canvas talks to.
//!
//! Only building request bodies and pulling the answer text out of a response live here; no
//! I/O happens in this module.

mod anthropic;
mod openai;

pub use anthropic::{build_anthropic_request, parse_anthropic_response, AnthropicRequest};
pub use openai::{build_openai_request, parse_openai_response, OpenAIRequest};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid content format: {0}")]
    InvalidContent(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
