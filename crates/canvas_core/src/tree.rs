//! Canvas - arena of conversation nodes plus the registry of roots
//!
//! A node is *linked* when its parent's `children` (or the root registry, for parentless
//! nodes) contains it, and *attached* when every node on its path up to a registered root
//! is linked. Only attached nodes are part of the live tree.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CanvasError, Result};
use crate::node::{ConversationNode, NodeId, Point};
use crate::renderer::{NullRenderer, Renderer};

/// One row of [`Canvas::outline`]
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub position: Point,
}

pub struct Canvas {
    nodes: HashMap<NodeId, ConversationNode>,
    roots: Vec<NodeId>,
    renderer: Box<dyn Renderer>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .finish()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_renderer(Box::new(NullRenderer))
    }

    pub fn with_renderer(renderer: Box<dyn Renderer>) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            renderer,
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&ConversationNode> {
        self.nodes.get(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&ConversationNode> {
        self.nodes.get(&id).ok_or(CanvasError::NodeNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut ConversationNode> {
        self.nodes.get_mut(&id).ok_or(CanvasError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes held by the arena, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node and link it as the last child of `parent`, or as a new root.
    ///
    /// Only tree structure changes; the renderer is not notified.
    pub fn create_child(
        &mut self,
        parent: Option<NodeId>,
        position: Point,
        model_id: impl Into<String>,
    ) -> Result<NodeId> {
        if let Some(parent) = parent {
            self.ensure_attached(parent)?;
        }

        let mut node = ConversationNode::new(model_id, position);
        node.parent = parent;
        let id = self.insert_unlinked(node);
        self.link_unchecked(id, parent, None);
        Ok(id)
    }

    /// Remove `id` from its parent's children (or from the roots) and return the index it
    /// occupied. Descendants stay structurally attached to `id`, and `id` keeps its parent
    /// handle so it can be put back.
    pub fn detach(&mut self, id: NodeId) -> Result<usize> {
        self.ensure_attached(id)?;
        let parent = self.get(id)?.parent;

        let siblings = match parent {
            Some(parent) => &mut self.get_mut(parent)?.children,
            None => &mut self.roots,
        };
        let index = siblings
            .iter()
            .position(|sibling| *sibling == id)
            .ok_or(CanvasError::NotAttached(id))?;
        siblings.remove(index);
        Ok(index)
    }

    /// Link `id` under `parent` (or as a root) at `index`, appending when `index` is `None`
    /// or past the end.
    pub fn attach_to_parent(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<()> {
        self.get(id)?;
        if let Some(parent) = parent {
            self.get(parent)?;
            if parent == id || self.subtree_pre_order(id).contains(&parent) {
                return Err(CanvasError::InvalidAttachment { node: id, parent });
            }
            self.ensure_attached(parent)?;
        }
        if self.is_linked(id) {
            return Err(CanvasError::AlreadyAttached(id));
        }

        self.get_mut(id)?.parent = parent;
        self.link_unchecked(id, parent, index);
        Ok(())
    }

    /// Whether `id` is reachable from a registered root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if !self.is_linked(current) {
                return false;
            }
            match self.nodes.get(&current).and_then(|node| node.parent) {
                Some(parent) => current = parent,
                None => return true,
            }
        }
    }

    pub(crate) fn is_linked(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        match node.parent {
            Some(parent) => self
                .nodes
                .get(&parent)
                .is_some_and(|parent| parent.children.contains(&id)),
            None => self.roots.contains(&id),
        }
    }

    pub(crate) fn ensure_attached(&self, id: NodeId) -> Result<()> {
        self.get(id)?;
        if self.is_attached(id) {
            Ok(())
        } else {
            Err(CanvasError::NotAttached(id))
        }
    }

    /// Ancestors of `id` from the root down to its parent; `id` itself is excluded.
    pub fn ancestor_chain_top_down(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.get(id)?.parent;
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.get(ancestor)?.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Root-to-node path, `id` included as the last element.
    pub fn path_from_root(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut path = self.ancestor_chain_top_down(id)?;
        path.push(id);
        Ok(path)
    }

    /// `id` followed by its descendants, depth-first in child order.
    pub fn subtree_pre_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Descendants of `id` before `id` itself; children before their parent.
    pub fn subtree_post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        order
    }

    fn collect_post_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        for child in &node.children {
            self.collect_post_order(*child, order);
        }
        order.push(id);
    }

    /// Every attached node, pre-order, roots in registry order.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .flat_map(|root| self.subtree_pre_order(*root))
            .collect()
    }

    pub fn live_node_count(&self) -> usize {
        self.live_nodes().len()
    }

    /// Resolve a child-index path: first index selects a root, the rest select children.
    pub fn locate(&self, path: &[usize]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        let mut current = *self.roots.get(*first)?;
        for index in rest {
            current = *self.nodes.get(&current)?.children.get(*index)?;
        }
        Some(current)
    }

    /// Inverse of [`Canvas::locate`] for attached nodes.
    pub fn path_indices(&self, id: NodeId) -> Option<Vec<usize>> {
        if !self.is_attached(id) {
            return None;
        }
        let mut indices = Vec::new();
        let mut current = id;
        loop {
            let node = self.nodes.get(&current)?;
            let siblings = match node.parent {
                Some(parent) => &self.nodes.get(&parent)?.children,
                None => &self.roots,
            };
            indices.push(siblings.iter().position(|sibling| *sibling == current)?);
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        indices.reverse();
        Some(indices)
    }

    /// Structure of the live tree, pre-order.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.live_nodes()
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|node| OutlineEntry {
                id: node.id,
                parent: node.parent,
                children: node.children.clone(),
                position: node.position,
            })
            .collect()
    }

    /// Apply a content change to a node and tell the renderer about it.
    pub fn update_node<F>(&mut self, id: NodeId, update: F) -> Result<()>
    where
        F: FnOnce(&mut ConversationNode),
    {
        let node = self.nodes.get_mut(&id).ok_or(CanvasError::NodeNotFound(id))?;
        update(node);
        self.renderer.node_updated(node);
        Ok(())
    }

    pub fn set_processing(&mut self, id: NodeId, processing: bool) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(CanvasError::NodeNotFound(id))?;
        node.processing = processing;
        self.renderer.node_updated(node);
        Ok(())
    }

    /// Drop a detached node and everything below it from the arena. Attached nodes, and
    /// nodes still linked under a detached parent, are left alone. Returns how many nodes
    /// were released.
    pub fn release(&mut self, id: NodeId) -> usize {
        if !self.contains(id) || self.is_linked(id) {
            return 0;
        }
        let subtree = self.subtree_pre_order(id);
        for node in &subtree {
            self.nodes.remove(node);
        }
        log::debug!("Released {} detached node(s) rooted at {}", subtree.len(), id);
        subtree.len()
    }

    /// Drop every node, telling the renderer about each live one.
    pub fn clear(&mut self) {
        for id in self.live_nodes() {
            self.renderer.node_removed(id);
        }
        self.nodes.clear();
        self.roots.clear();
    }

    pub(crate) fn insert_unlinked(&mut self, node: ConversationNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Push `id` into `parent`'s children (or the roots) without any validation.
    pub(crate) fn link_unchecked(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) {
        let siblings = match parent {
            Some(parent) => match self.nodes.get_mut(&parent) {
                Some(parent) => &mut parent.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let index = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, id);
    }

    pub(crate) fn notify_added(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get(&id) {
            self.renderer.node_added(node);
            if let Some(link) = node.link() {
                self.renderer.link_added(link);
            }
        }
    }

    pub(crate) fn notify_removed(&mut self, id: NodeId) {
        if let Some(link) = self.nodes.get(&id).and_then(ConversationNode::link) {
            self.renderer.link_removed(link);
        }
        self.renderer.node_removed(id);
    }

    pub(crate) fn notify_moved(&mut self, id: NodeId) {
        for node in self.subtree_pre_order(id) {
            if let Some(node) = self.nodes.get(&node) {
                self.renderer.node_moved(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Canvas, NodeId, NodeId, NodeId) {
        let mut canvas = Canvas::new();
        let root = canvas.create_child(None, Point::default(), "m").unwrap();
        let a = canvas.create_child(Some(root), Point::new(0.0, 100.0), "m").unwrap();
        let b = canvas.create_child(Some(a), Point::new(0.0, 200.0), "m").unwrap();
        (canvas, root, a, b)
    }

    #[test]
    fn create_child_appends_in_creation_order() {
        let mut canvas = Canvas::new();
        let root = canvas.create_child(None, Point::default(), "m").unwrap();
        let first = canvas.create_child(Some(root), Point::default(), "m").unwrap();
        let second = canvas.create_child(Some(root), Point::default(), "m").unwrap();

        assert_eq!(canvas.roots(), &[root]);
        assert_eq!(canvas.get(root).unwrap().children(), &[first, second]);
        assert_eq!(canvas.get(second).unwrap().parent(), Some(root));
    }

    #[test]
    fn ancestor_chain_excludes_self_and_starts_at_root() {
        let (canvas, root, a, b) = chain();
        assert_eq!(canvas.ancestor_chain_top_down(b).unwrap(), vec![root, a]);
        assert_eq!(canvas.path_from_root(b).unwrap(), vec![root, a, b]);
        assert!(canvas.ancestor_chain_top_down(root).unwrap().is_empty());
    }

    #[test]
    fn detach_keeps_descendants_under_the_detached_node() {
        let (mut canvas, root, a, b) = chain();

        let index = canvas.detach(a).unwrap();
        assert_eq!(index, 0);
        assert!(canvas.get(root).unwrap().children().is_empty());
        assert!(!canvas.is_attached(a));
        assert!(!canvas.is_attached(b));
        assert_eq!(canvas.get(a).unwrap().children(), &[b]);
        assert_eq!(canvas.live_node_count(), 1);

        canvas.attach_to_parent(a, Some(root), Some(index)).unwrap();
        assert!(canvas.is_attached(b));
        assert_eq!(canvas.live_node_count(), 3);
    }

    #[test]
    fn attaching_to_self_or_descendant_is_rejected() {
        let (mut canvas, root, a, b) = chain();
        let before = canvas.outline();

        assert_eq!(
            canvas.attach_to_parent(a, Some(a), None),
            Err(CanvasError::InvalidAttachment { node: a, parent: a })
        );
        assert_eq!(
            canvas.attach_to_parent(root, Some(b), None),
            Err(CanvasError::InvalidAttachment { node: root, parent: b })
        );
        assert_eq!(canvas.outline(), before);
    }

    #[test]
    fn attaching_a_linked_node_is_rejected() {
        let (mut canvas, root, _a, b) = chain();
        assert_eq!(
            canvas.attach_to_parent(b, Some(root), None),
            Err(CanvasError::AlreadyAttached(b))
        );
    }

    #[test]
    fn create_child_under_detached_parent_fails() {
        let (mut canvas, _root, a, b) = chain();
        canvas.detach(a).unwrap();
        assert_eq!(
            canvas.create_child(Some(b), Point::default(), "m"),
            Err(CanvasError::NotAttached(b))
        );
    }

    #[test]
    fn locate_and_path_indices_are_inverse() {
        let (mut canvas, root, a, b) = chain();
        let sibling = canvas.create_child(Some(root), Point::default(), "m").unwrap();

        assert_eq!(canvas.locate(&[0]), Some(root));
        assert_eq!(canvas.locate(&[0, 0, 0]), Some(b));
        assert_eq!(canvas.locate(&[0, 1]), Some(sibling));
        assert_eq!(canvas.locate(&[0, 2]), None);
        assert_eq!(canvas.path_indices(b), Some(vec![0, 0, 0]));
        assert_eq!(canvas.path_indices(sibling), Some(vec![0, 1]));

        canvas.detach(a).unwrap();
        assert_eq!(canvas.path_indices(b), None);
    }

    #[test]
    fn post_order_visits_children_first() {
        let (mut canvas, root, a, b) = chain();
        let c = canvas.create_child(Some(root), Point::default(), "m").unwrap();
        assert_eq!(canvas.subtree_post_order(root), vec![b, a, c, root]);
        assert_eq!(canvas.subtree_pre_order(root), vec![root, a, b, c]);
    }

    #[test]
    fn release_only_drops_unlinked_subtrees() {
        let (mut canvas, _root, a, b) = chain();
        assert_eq!(canvas.release(a), 0);

        canvas.detach(a).unwrap();
        assert_eq!(canvas.release(b), 0, "b is still linked under a");
        assert_eq!(canvas.release(a), 2);
        assert!(!canvas.contains(a));
        assert!(!canvas.contains(b));
        assert_eq!(canvas.len(), 1);
    }
}
