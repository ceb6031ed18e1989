use crate::error::{CanvasError, Result};
use crate::node::{NodeId, Point};
use crate::tree::Canvas;

/// Create a node as the last child of `parent`, or as a new root.
///
/// Undo unlinks the node but the command keeps hold of it, so redo brings back the very same
/// node rather than a fresh copy.
#[derive(Debug, Clone)]
pub struct CreateNode {
    parent: Option<NodeId>,
    position: Point,
    model_id: String,
    prompt: Option<String>,
    created: Option<NodeId>,
    applied: bool,
}

impl CreateNode {
    pub fn new(parent: Option<NodeId>, position: Point, model_id: impl Into<String>) -> Self {
        Self {
            parent,
            position,
            model_id: model_id.into(),
            prompt: None,
            created: None,
            applied: false,
        }
    }

    /// Seed the new node's prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node this command created, once executed
    pub fn created(&self) -> Option<NodeId> {
        self.created
    }

    pub(crate) fn execute(&mut self, canvas: &mut Canvas) -> Result<()> {
        if self.applied {
            return Err(CanvasError::AlreadyApplied);
        }
        if let Some(parent) = self.parent {
            canvas.ensure_attached(parent)?;
        }

        let id = match self.created.filter(|id| canvas.contains(*id)) {
            Some(id) => {
                canvas.attach_to_parent(id, self.parent, None)?;
                id
            }
            None => {
                let id = canvas.create_child(self.parent, self.position, self.model_id.clone())?;
                if let Some(prompt) = &self.prompt {
                    canvas.get_mut(id)?.prompt = prompt.clone();
                }
                id
            }
        };

        canvas.notify_added(id);
        self.created = Some(id);
        self.applied = true;
        Ok(())
    }

    pub(crate) fn undo(&mut self, canvas: &mut Canvas) -> Result<()> {
        if !self.applied {
            return Err(CanvasError::NotApplied);
        }
        let id = self.created.ok_or(CanvasError::NotApplied)?;

        canvas.ensure_attached(id)?;
        canvas.notify_removed(id);
        canvas.detach(id)?;
        self.applied = false;
        Ok(())
    }

    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        self.parent.into_iter().chain(self.created).collect()
    }
}
