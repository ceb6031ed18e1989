//! Sequential re-run of a root-to-leaf path
//!
//! Each step waits for the previous node's result (success or failure) before the next one
//! is submitted, so every node is answered with its ancestors' fresh responses in context.
//! A step is `Queued` until its own request has been submitted; results that arrive while
//! queued belong to some other request and only mean the node is free to be submitted.

use canvas_core::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerunState {
    Idle,
    /// Step selected, its request not yet submitted. `step` is 1-based.
    Queued { step: usize, total: usize, node: NodeId },
    /// The step's own request is in flight
    Running { step: usize, total: usize, node: NodeId },
    Done,
}

#[derive(Debug, Clone)]
pub struct RerunScheduler {
    path: Vec<NodeId>,
    state: RerunState,
}

impl Default for RerunScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RerunScheduler {
    pub fn new() -> Self {
        Self {
            path: Vec::new(),
            state: RerunState::Idle,
        }
    }

    pub fn state(&self) -> RerunState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == RerunState::Done
    }

    /// The node of the current step
    pub fn awaiting(&self) -> Option<NodeId> {
        match self.state {
            RerunState::Queued { node, .. } | RerunState::Running { node, .. } => Some(node),
            RerunState::Idle | RerunState::Done => None,
        }
    }

    /// Record that the current step's own request went out.
    pub fn mark_submitted(&mut self) {
        if let RerunState::Queued { step, total, node } = self.state {
            self.state = RerunState::Running { step, total, node };
        }
    }

    /// Begin at the first node of `path` (root first). An empty path finishes immediately.
    pub fn start(&mut self, path: Vec<NodeId>) -> Option<NodeId> {
        self.path = path;
        self.enter_step(0)
    }

    /// A node finished and returns the node to submit next, if any.
    ///
    /// For a queued step the same node comes back, to be submitted now that it is free.
    /// For a running step the chain advances. Other nodes are ignored.
    pub fn on_child_notify(&mut self, node: NodeId) -> Option<NodeId> {
        match self.state {
            RerunState::Queued { node: current, .. } if current == node => Some(node),
            RerunState::Running { node: current, .. } if current == node => self.advance(),
            _ => None,
        }
    }

    /// Move past the current step without waiting, e.g. when it has nothing to submit.
    pub fn advance(&mut self) -> Option<NodeId> {
        match self.state {
            RerunState::Queued { step, .. } | RerunState::Running { step, .. } => self.enter_step(step),
            RerunState::Idle | RerunState::Done => None,
        }
    }

    fn enter_step(&mut self, index: usize) -> Option<NodeId> {
        match self.path.get(index) {
            Some(node) => {
                self.state = RerunState::Queued {
                    step: index + 1,
                    total: self.path.len(),
                    node: *node,
                };
                log::info!("Re-run step {}/{}: node {}", index + 1, self.path.len(), node);
                Some(*node)
            }
            None => {
                if self.state != RerunState::Done {
                    log::info!("Re-run finished after {} step(s)", self.path.len());
                }
                self.state = RerunState::Done;
                None
            }
        }
    }
}
