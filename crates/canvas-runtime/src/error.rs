use canvas_core::{CanvasError, NodeId, PersistenceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("Node {0} already has a request in flight")]
    AlreadyProcessing(NodeId),

    #[error("Node {0} has an empty prompt")]
    EmptyPrompt(NodeId),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
