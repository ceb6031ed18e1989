use crate::error::{CanvasError, Result};
use crate::node::{NodeId, Point};
use crate::tree::Canvas;

/// Reposition a node. Parent/child relationships never change.
#[derive(Debug, Clone)]
pub struct MoveNode {
    node: NodeId,
    old_position: Point,
    new_position: Point,
    applied: bool,
}

impl MoveNode {
    pub fn new(node: NodeId, old_position: Point, new_position: Point) -> Self {
        Self {
            node,
            old_position,
            new_position,
            applied: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn execute(&mut self, canvas: &mut Canvas) -> Result<()> {
        if self.applied {
            return Err(CanvasError::AlreadyApplied);
        }
        self.place(canvas, self.new_position)?;
        self.applied = true;
        Ok(())
    }

    pub(crate) fn undo(&mut self, canvas: &mut Canvas) -> Result<()> {
        if !self.applied {
            return Err(CanvasError::NotApplied);
        }
        self.place(canvas, self.old_position)?;
        self.applied = false;
        Ok(())
    }

    fn place(&self, canvas: &mut Canvas, position: Point) -> Result<()> {
        canvas.get_mut(self.node)?.position = position;
        // Link endpoints hang off ancestor positions, so the whole subtree is repositioned
        canvas.notify_moved(self.node);
        Ok(())
    }

    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        vec![self.node]
    }
}
