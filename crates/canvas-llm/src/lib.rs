pub mod backend;
pub mod protocol;
pub mod provider;
pub mod providers;
pub mod reader;
pub mod resolver;
pub mod search;

pub use backend::{HttpBackend, InferenceBackend};
pub use provider::{LLMError, LLMProvider, Result};
pub use providers::{AnthropicProvider, OpenAICompatProvider};
pub use reader::RemoteReader;
pub use resolver::{resolve_model, ProviderKind, ResolvedModel};
pub use search::{SearchResult, WebSearch};
