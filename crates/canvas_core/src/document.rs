//! Saved canvas documents
//!
//! A document is a forest of nested node records, roots in registry order. Documents carry
//! no node ids; loading allocates fresh ones.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PersistenceError;
use crate::node::{ConversationNode, NodeId, Point, Size, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};
use crate::tree::Canvas;

fn default_width() -> f64 {
    DEFAULT_NODE_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_NODE_HEIGHT
}

fn default_zoom() -> f64 {
    1.0
}

/// Older documents stored `null` when no model had been picked
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub pos_x: f64,
    pub pos_y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub input: String,
    /// Response markdown
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model: String,
    #[serde(default)]
    pub selected_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    #[serde(default = "default_zoom")]
    pub zoom_factor: f64,
    #[serde(default)]
    pub canvas_state: Vec<NodeDocument>,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self {
            zoom_factor: default_zoom(),
            canvas_state: Vec::new(),
        }
    }
}

impl CanvasDocument {
    /// Snapshot the live tree.
    pub fn from_canvas(canvas: &Canvas, zoom_factor: f64) -> Self {
        Self {
            zoom_factor,
            canvas_state: canvas
                .roots()
                .iter()
                .filter_map(|root| Self::node_document(canvas, *root))
                .collect(),
        }
    }

    fn node_document(canvas: &Canvas, id: NodeId) -> Option<NodeDocument> {
        let node = canvas.node(id)?;
        Some(NodeDocument {
            pos_x: node.position.x,
            pos_y: node.position.y,
            width: node.size.width,
            height: node.size.height,
            input: node.prompt.clone(),
            context: node.response_markdown.clone(),
            children: node
                .children()
                .iter()
                .filter_map(|child| Self::node_document(canvas, *child))
                .collect(),
            model: node.model_id.clone(),
            selected_files: node.attached_file_paths.clone(),
        })
    }

    /// Replace everything on `canvas` with this document's nodes. Returns the new roots.
    ///
    /// The renderer sees the same calls it would for nodes created one by one.
    pub fn restore_into(&self, canvas: &mut Canvas) -> Vec<NodeId> {
        canvas.clear();
        let mut roots = Vec::with_capacity(self.canvas_state.len());
        for root in &self.canvas_state {
            roots.push(Self::restore_node(canvas, root, None));
        }
        log::info!(
            "Restored {} node(s) under {} root(s)",
            canvas.live_node_count(),
            roots.len()
        );
        roots
    }

    fn restore_node(canvas: &mut Canvas, document: &NodeDocument, parent: Option<NodeId>) -> NodeId {
        let mut node = ConversationNode::new(
            document.model.clone(),
            Point::new(document.pos_x, document.pos_y),
        );
        node.size = Size::new(document.width, document.height);
        node.prompt = document.input.clone();
        node.response_markdown = document.context.clone();
        node.attached_file_paths = document.selected_files.clone();
        node.parent = parent;

        let id = canvas.insert_unlinked(node);
        canvas.link_unchecked(id, parent, None);
        canvas.notify_added(id);
        for child in &document.children {
            Self::restore_node(canvas, child, Some(id));
        }
        id
    }
}

pub fn load_document(path: &Path) -> Result<CanvasDocument, PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let document = serde_json::from_str(&content)?;
    log::debug!("Loaded canvas document from {}", path.display());
    Ok(document)
}

pub fn save_document(path: &Path, document: &CanvasDocument) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(document)?;
    std::fs::write(path, content)?;
    log::debug!("Saved canvas document to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_their_defaults() {
        let json = r#"{
            "canvas_state": [
                {"pos_x": 1.0, "pos_y": 2.0, "input": "hi", "context": "", "model": null, "children": []}
            ]
        }"#;
        let document: CanvasDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.zoom_factor, 1.0);

        let node = &document.canvas_state[0];
        assert_eq!((node.width, node.height), (300.0, 200.0));
        assert_eq!(node.model, "");
        assert!(node.selected_files.is_empty());
    }

    #[test]
    fn serializes_with_the_saved_field_names() {
        let document = CanvasDocument {
            zoom_factor: 1.5,
            canvas_state: vec![NodeDocument {
                pos_x: 0.0,
                pos_y: 0.0,
                width: 300.0,
                height: 200.0,
                input: "q".to_string(),
                context: "a".to_string(),
                children: Vec::new(),
                model: "llama3:latest".to_string(),
                selected_files: vec!["notes.md".to_string()],
            }],
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["zoom_factor"], 1.5);
        let node = &value["canvas_state"][0];
        for key in ["pos_x", "pos_y", "width", "height", "input", "context", "children", "model", "selected_files"] {
            assert!(node.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn restore_replaces_existing_nodes() {
        let mut canvas = Canvas::new();
        let stale = canvas.create_child(None, Point::default(), "m").unwrap();

        let document = CanvasDocument {
            zoom_factor: 1.0,
            canvas_state: vec![NodeDocument {
                pos_x: 10.0,
                pos_y: 20.0,
                width: 320.0,
                height: 240.0,
                input: "root".to_string(),
                context: "answer".to_string(),
                children: vec![NodeDocument {
                    pos_x: 400.0,
                    pos_y: 20.0,
                    width: 300.0,
                    height: 200.0,
                    input: "child".to_string(),
                    context: String::new(),
                    children: Vec::new(),
                    model: "mistral:latest".to_string(),
                    selected_files: Vec::new(),
                }],
                model: "llama3:latest".to_string(),
                selected_files: Vec::new(),
            }],
        };

        let roots = document.restore_into(&mut canvas);
        assert!(!canvas.contains(stale));
        assert_eq!(canvas.roots(), roots.as_slice());

        let root = canvas.get(roots[0]).unwrap();
        assert_eq!(root.size, Size::new(320.0, 240.0));
        assert_eq!(root.response_markdown, "answer");
        let child = canvas.get(root.children()[0]).unwrap();
        assert_eq!(child.prompt, "child");
        assert_eq!(child.parent(), Some(roots[0]));
        assert_eq!(CanvasDocument::from_canvas(&canvas, 1.0), document);
    }

    #[test]
    fn loading_a_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load_document(&path), Err(PersistenceError::NotFound(p)) if p == path));
    }

    #[test]
    fn loading_garbage_reports_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_document(&path), Err(PersistenceError::Malformed(_))));
    }
}
