//! Renderer - the on-screen representation the canvas keeps in sync
//!
//! The core never draws anything. It reports structure and content changes through this
//! trait and the UI layer decides what to do with them.

use crate::node::{ConversationNode, Link, NodeId};

pub trait Renderer: Send {
    /// A node became part of the live tree
    fn node_added(&mut self, _node: &ConversationNode) {}

    /// A node left the live tree
    fn node_removed(&mut self, _node: NodeId) {}

    fn link_added(&mut self, _link: Link) {}

    fn link_removed(&mut self, _link: Link) {}

    /// Position changed; links ending at this node need repositioning
    fn node_moved(&mut self, _node: &ConversationNode) {}

    /// Prompt, response or processing state changed
    fn node_updated(&mut self, _node: &ConversationNode) {}
}

/// Renderer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}
