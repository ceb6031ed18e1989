use std::path::PathBuf;

use thiserror::Error;

use crate::node::NodeId;

/// Structural violations. Operations that return one of these leave the canvas untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Cannot attach {node} under {parent}: parent is the node itself or one of its descendants")]
    InvalidAttachment { node: NodeId, parent: NodeId },

    #[error("Node is already attached: {0}")]
    AlreadyAttached(NodeId),

    #[error("Node is not attached to the canvas: {0}")]
    NotAttached(NodeId),

    #[error("Command has already been applied")]
    AlreadyApplied,

    #[error("Command has not been applied")]
    NotApplied,
}

pub type Result<T> = std::result::Result<T, CanvasError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Unable to find file {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
