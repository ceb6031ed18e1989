//! ConversationNode - one prompt/response exchange on the canvas
//!
//! Nodes live in the [`Canvas`](crate::Canvas) arena and refer to each other by [`NodeId`].
//! `children` is the owning edge, `parent` is a plain handle back up the tree.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NODE_WIDTH: f64 = 300.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 200.0;

/// Process-local handle of a node in the canvas arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell nodes apart in logs
        let id = self.0.simple().to_string();
        write!(f, "{}", &id[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT)
    }
}

/// Visual link between a parent and one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub parent: NodeId,
    pub child: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationNode {
    pub(crate) id: NodeId,
    pub prompt: String,
    pub response_markdown: String,
    pub model_id: String,
    pub position: Point,
    pub size: Size,
    pub attached_file_paths: Vec<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) processing: bool,
}

impl ConversationNode {
    pub(crate) fn new(model_id: impl Into<String>, position: Point) -> Self {
        Self {
            id: NodeId::new(),
            prompt: String::new(),
            response_markdown: String::new(),
            model_id: model_id.into(),
            position,
            size: Size::default(),
            attached_file_paths: Vec::new(),
            parent: None,
            children: Vec::new(),
            processing: false,
        }
    }

    /// Copy the content of `source` into a fresh, unlinked node
    pub(crate) fn content_copy(source: &ConversationNode, position: Point) -> Self {
        Self {
            prompt: source.prompt.clone(),
            response_markdown: source.response_markdown.clone(),
            size: source.size,
            attached_file_paths: source.attached_file_paths.clone(),
            ..Self::new(source.model_id.clone(), position)
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether an inference request for this node is in flight
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// The link from this node's parent, if it has one
    pub fn link(&self) -> Option<Link> {
        self.parent.map(|parent| Link {
            parent,
            child: self.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic_keeps_relative_offsets() {
        let parent = Point::new(100.0, 50.0);
        let child = Point::new(400.0, 250.0);
        let moved_parent = Point::new(-20.0, 10.0);

        let relocated = moved_parent + (child - parent);
        assert_eq!(relocated, Point::new(280.0, 210.0));
    }

    #[test]
    fn new_node_uses_default_size() {
        let node = ConversationNode::new("llama3:latest", Point::default());
        assert_eq!(node.size, Size::new(300.0, 200.0));
        assert!(node.parent().is_none());
        assert!(node.link().is_none());
        assert!(!node.is_processing());
    }

    #[test]
    fn content_copy_gets_a_fresh_identity() {
        let mut source = ConversationNode::new("mistral:latest", Point::new(1.0, 2.0));
        source.prompt = "why".to_string();
        source.response_markdown = "because".to_string();
        source.attached_file_paths = vec!["a.txt".to_string()];
        source.processing = true;

        let copy = ConversationNode::content_copy(&source, Point::new(5.0, 5.0));
        assert_ne!(copy.id(), source.id());
        assert_eq!(copy.prompt, "why");
        assert_eq!(copy.response_markdown, "because");
        assert_eq!(copy.model_id, "mistral:latest");
        assert_eq!(copy.attached_file_paths, vec!["a.txt".to_string()]);
        assert_eq!(copy.position, Point::new(5.0, 5.0));
        assert!(!copy.is_processing());
        assert!(copy.children().is_empty());
    }
}
