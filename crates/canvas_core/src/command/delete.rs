use crate::error::{CanvasError, Result};
use crate::node::{Link, NodeId, Point};
use crate::tree::Canvas;

/// What undo needs to put one deleted node back
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedEntry {
    pub node: NodeId,
    pub position: Point,
    pub link: Option<Link>,
}

/// Remove a node and its entire subtree from the live tree.
#[derive(Debug, Clone)]
pub struct DeleteSubtree {
    node: NodeId,
    parent: Option<NodeId>,
    index: usize,
    deleted: Vec<DeletedEntry>,
    applied: bool,
}

impl DeleteSubtree {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
            deleted: Vec::new(),
            applied: false,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Deleted nodes in deletion order, children before their parent
    pub fn deleted(&self) -> &[DeletedEntry] {
        &self.deleted
    }

    pub(crate) fn execute(&mut self, canvas: &mut Canvas) -> Result<()> {
        if self.applied {
            return Err(CanvasError::AlreadyApplied);
        }
        canvas.ensure_attached(self.node)?;

        let parent = canvas.get(self.node)?.parent();
        let mut deleted = Vec::new();
        for id in canvas.subtree_post_order(self.node) {
            let node = canvas.get(id)?;
            deleted.push(DeletedEntry {
                node: id,
                position: node.position,
                link: node.link(),
            });
        }

        for entry in &deleted {
            canvas.notify_removed(entry.node);
        }
        self.index = canvas.detach(self.node)?;
        self.parent = parent;
        self.deleted = deleted;
        self.applied = true;

        log::debug!(
            "Deleted subtree rooted at {} ({} node(s))",
            self.node,
            self.deleted.len()
        );
        Ok(())
    }

    pub(crate) fn undo(&mut self, canvas: &mut Canvas) -> Result<()> {
        if !self.applied {
            return Err(CanvasError::NotApplied);
        }
        if let Some(parent) = self.parent {
            canvas.ensure_attached(parent)?;
        }
        for entry in &self.deleted {
            canvas.get(entry.node)?;
        }

        canvas.attach_to_parent(self.node, self.parent, Some(self.index))?;
        for entry in self.deleted.iter().rev() {
            canvas.get_mut(entry.node)?.position = entry.position;
            canvas.notify_added(entry.node);
        }
        self.applied = false;
        Ok(())
    }

    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.parent.into_iter().collect();
        nodes.push(self.node);
        nodes.extend(self.deleted.iter().map(|entry| entry.node));
        nodes
    }
}
