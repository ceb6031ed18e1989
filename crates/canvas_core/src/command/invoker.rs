use std::collections::HashSet;

use crate::command::Command;
use crate::error::Result;
use crate::node::NodeId;
use crate::tree::Canvas;

/// Linear undo/redo over executed commands.
///
/// Executing a new command discards the redo stack; there is no branching history.
#[derive(Debug, Default)]
pub struct CommandInvoker {
    history: Vec<Command>,
    redo_stack: Vec<Command>,
}

impl CommandInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `command` and record it. A failing command is not recorded and the canvas is
    /// left as it was.
    pub fn execute(&mut self, canvas: &mut Canvas, command: impl Into<Command>) -> Result<&Command> {
        let mut command = command.into();
        command.execute(canvas)?;
        log::debug!("Executed {}", command.name());

        let dropped = std::mem::take(&mut self.redo_stack);
        let index = self.history.len();
        self.history.push(command);
        self.release_dropped(canvas, dropped);

        Ok(&self.history[index])
    }

    /// Undo the most recent command. Returns `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, canvas: &mut Canvas) -> Result<bool> {
        let Some(mut command) = self.history.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.undo(canvas) {
            self.history.push(command);
            return Err(err);
        }
        log::debug!("Undid {}", command.name());
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Re-execute the most recently undone command. Returns `Ok(false)` when there is nothing
    /// to redo.
    pub fn redo(&mut self, canvas: &mut Canvas) -> Result<bool> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = command.execute(canvas) {
            self.redo_stack.push(command);
            return Err(err);
        }
        log::debug!("Redid {}", command.name());
        self.history.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn history(&self) -> &[Command] {
        &self.history
    }

    pub fn redo_stack(&self) -> &[Command] {
        &self.redo_stack
    }

    /// Forget everything, e.g. when a different document is loaded.
    pub fn clear(&mut self) {
        self.history.clear();
        self.redo_stack.clear();
    }

    /// Nodes that only the dropped commands kept alive leave the arena for good.
    fn release_dropped(&self, canvas: &mut Canvas, dropped: Vec<Command>) {
        if dropped.is_empty() {
            return;
        }
        let retained: HashSet<NodeId> = self
            .history
            .iter()
            .flat_map(Command::referenced_nodes)
            .collect();

        let mut released = 0;
        for node in dropped.iter().flat_map(Command::referenced_nodes) {
            if !retained.contains(&node) && !canvas.is_attached(node) {
                released += canvas.release(node);
            }
        }
        if released > 0 {
            log::debug!("Released {} node(s) no longer reachable from undo history", released);
        }
    }
}
