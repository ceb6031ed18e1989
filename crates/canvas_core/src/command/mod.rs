//! Reversible tree mutations
//!
//! Every gesture that changes the shape of the tree (or where a node sits) goes through a
//! [`Command`] pushed into the [`CommandInvoker`]. Each variant captures its own reversal
//! payload during `execute` and validates everything it touches before it mutates anything.

mod clone;
mod create;
mod delete;
mod invoker;
mod move_node;

pub use clone::{CloneBranch, DEFAULT_CLONE_OFFSET};
pub use create::CreateNode;
pub use delete::{DeleteSubtree, DeletedEntry};
pub use invoker::CommandInvoker;
pub use move_node::MoveNode;

use crate::error::Result;
use crate::node::NodeId;
use crate::tree::Canvas;

#[derive(Debug, Clone)]
pub enum Command {
    CreateNode(CreateNode),
    DeleteSubtree(DeleteSubtree),
    MoveNode(MoveNode),
    CloneBranch(CloneBranch),
}

impl Command {
    pub fn execute(&mut self, canvas: &mut Canvas) -> Result<()> {
        match self {
            Command::CreateNode(command) => command.execute(canvas),
            Command::DeleteSubtree(command) => command.execute(canvas),
            Command::MoveNode(command) => command.execute(canvas),
            Command::CloneBranch(command) => command.execute(canvas),
        }
    }

    pub fn undo(&mut self, canvas: &mut Canvas) -> Result<()> {
        match self {
            Command::CreateNode(command) => command.undo(canvas),
            Command::DeleteSubtree(command) => command.undo(canvas),
            Command::MoveNode(command) => command.undo(canvas),
            Command::CloneBranch(command) => command.undo(canvas),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode(_) => "create_node",
            Command::DeleteSubtree(_) => "delete_subtree",
            Command::MoveNode(_) => "move_node",
            Command::CloneBranch(_) => "clone_branch",
        }
    }

    /// The node a create or clone brought into the tree
    pub fn created_node(&self) -> Option<NodeId> {
        match self {
            Command::CreateNode(command) => command.created(),
            Command::CloneBranch(command) => command.cloned_root(),
            Command::DeleteSubtree(_) | Command::MoveNode(_) => None,
        }
    }

    /// Nodes whose lifetime this command depends on
    pub(crate) fn referenced_nodes(&self) -> Vec<NodeId> {
        match self {
            Command::CreateNode(command) => command.referenced_nodes(),
            Command::DeleteSubtree(command) => command.referenced_nodes(),
            Command::MoveNode(command) => command.referenced_nodes(),
            Command::CloneBranch(command) => command.referenced_nodes(),
        }
    }
}

impl From<CreateNode> for Command {
    fn from(command: CreateNode) -> Self {
        Command::CreateNode(command)
    }
}

impl From<DeleteSubtree> for Command {
    fn from(command: DeleteSubtree) -> Self {
        Command::DeleteSubtree(command)
    }
}

impl From<MoveNode> for Command {
    fn from(command: MoveNode) -> Self {
        Command::MoveNode(command)
    }
}

impl From<CloneBranch> for Command {
    fn from(command: CloneBranch) -> Self {
        Command::CloneBranch(command)
    }
}
