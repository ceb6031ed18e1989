use crate::error::{CanvasError, Result};
use crate::node::{ConversationNode, NodeId, Point};
use crate::tree::Canvas;

/// Offset of a cloned branch from its source
pub const DEFAULT_CLONE_OFFSET: Point = Point::new(200.0, 600.0);

/// Deep-copy a node and its subtree, attaching the copy as a sibling of the source.
#[derive(Debug, Clone)]
pub struct CloneBranch {
    source: NodeId,
    offset: Point,
    parent: Option<NodeId>,
    cloned: Vec<NodeId>,
    applied: bool,
}

impl CloneBranch {
    pub fn new(source: NodeId) -> Self {
        Self::with_offset(source, DEFAULT_CLONE_OFFSET)
    }

    pub fn with_offset(source: NodeId, offset: Point) -> Self {
        Self {
            source,
            offset,
            parent: None,
            cloned: Vec::new(),
            applied: false,
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Nodes created by the clone, root first, depth-first
    pub fn cloned(&self) -> &[NodeId] {
        &self.cloned
    }

    pub fn cloned_root(&self) -> Option<NodeId> {
        self.cloned.first().copied()
    }

    pub(crate) fn execute(&mut self, canvas: &mut Canvas) -> Result<()> {
        if self.applied {
            return Err(CanvasError::AlreadyApplied);
        }

        let root = match self.cloned_root().filter(|root| canvas.contains(*root)) {
            Some(root) => {
                if let Some(parent) = self.parent {
                    canvas.ensure_attached(parent)?;
                }
                root
            }
            None => {
                canvas.ensure_attached(self.source)?;
                self.parent = canvas.get(self.source)?.parent();
                self.cloned = Self::copy_subtree(canvas, self.source, self.parent, self.offset)?;
                self.cloned.first().copied().ok_or(CanvasError::NodeNotFound(self.source))?
            }
        };

        canvas.link_unchecked(root, self.parent, None);
        for id in &self.cloned {
            canvas.notify_added(*id);
        }
        self.applied = true;

        log::debug!(
            "Cloned branch {} into {} ({} node(s))",
            self.source,
            root,
            self.cloned.len()
        );
        Ok(())
    }

    pub(crate) fn undo(&mut self, canvas: &mut Canvas) -> Result<()> {
        if !self.applied {
            return Err(CanvasError::NotApplied);
        }
        let root = self.cloned_root().ok_or(CanvasError::NotApplied)?;
        canvas.ensure_attached(root)?;

        for id in self.cloned.iter().rev() {
            canvas.notify_removed(*id);
        }
        // Descendants hang off the cloned root, only the root is linked into the source's parent
        canvas.detach(root)?;
        self.applied = false;
        Ok(())
    }

    /// Copy `source`'s subtree into new nodes. The copies are linked to each other but the
    /// copied root is left unlinked; the caller links it once everything is in place.
    fn copy_subtree(
        canvas: &mut Canvas,
        source: NodeId,
        parent: Option<NodeId>,
        offset: Point,
    ) -> Result<Vec<NodeId>> {
        let mut cloned = Vec::new();
        let mut pending = vec![(source, parent, canvas.get(source)?.position + offset)];

        while let Some((original, cloned_parent, position)) = pending.pop() {
            let original_node = canvas.get(original)?;
            let mut copy = ConversationNode::content_copy(original_node, position);
            copy.parent = cloned_parent;
            let relative_children: Vec<(NodeId, Point)> = original_node
                .children()
                .iter()
                .filter_map(|child| canvas.node(*child))
                .map(|child| (child.id(), child.position - original_node.position))
                .collect();

            let id = canvas.insert_unlinked(copy);
            if !cloned.is_empty() {
                canvas.link_unchecked(id, cloned_parent, None);
            }
            cloned.push(id);

            for (child, relative) in relative_children.into_iter().rev() {
                pending.push((child, Some(id), position + relative));
            }
        }

        Ok(cloned)
    }

    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut nodes = vec![self.source];
        nodes.extend(self.parent);
        nodes.extend(self.cloned.iter().copied());
        nodes
    }
}
