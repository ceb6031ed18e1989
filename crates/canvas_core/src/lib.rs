//! Canvas core: the conversation tree, its reversible commands, context assembly and the
//! saved document format.

pub mod command;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod models;
pub mod node;
pub mod paths;
pub mod renderer;
pub mod tree;

pub use command::{CloneBranch, Command, CommandInvoker, CreateNode, DeleteSubtree, MoveNode};
pub use config::Config;
pub use context::{ChatMessage, ContextAssembler, Role, FOLLOW_UP_PROMPT};
pub use document::{load_document, save_document, CanvasDocument, NodeDocument};
pub use error::{CanvasError, ConfigError, PersistenceError, Result};
pub use models::ModelList;
pub use node::{ConversationNode, Link, NodeId, Point, Size};
pub use renderer::{NullRenderer, Renderer};
pub use tree::{Canvas, OutlineEntry};
