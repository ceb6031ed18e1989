//! Canvas session
//!
//! The session is the single owner of the canvas. Gestures arrive as method calls, model
//! results arrive through [`CanvasSession::next_event`], and both are applied on the caller's
//! task, so tree mutation never races with inference.

use std::path::Path;
use std::sync::Arc;

use canvas_core::{
    load_document, save_document, Canvas, CanvasDocument, CanvasError, CloneBranch, CommandInvoker,
    ContextAssembler, CreateNode, DeleteSubtree, MoveNode, NodeId, Point, Renderer,
};
use canvas_llm::InferenceBackend;
use rand::Rng;
use tokio::sync::mpsc;

use crate::busy::BusyCounter;
use crate::classify::RequestStrategy;
use crate::config::SessionConfig;
use crate::coordinator::{
    CoordinatorOptions, Delivery, InferenceCoordinator, InferenceEvent, InferenceRequest, Purpose,
};
use crate::error::{Result, SessionError};
use crate::scheduler::RerunScheduler;

/// Offset of an "explain this" child from the node the text was selected in
pub const EXPLAIN_OFFSET: Point = Point::new(500.0, 200.0);

const FORK_MIN_GAP: i32 = 100;

pub struct CanvasSession {
    canvas: Canvas,
    invoker: CommandInvoker,
    coordinator: InferenceCoordinator,
    events: mpsc::UnboundedReceiver<InferenceEvent>,
    reruns: Vec<RerunScheduler>,
    config: SessionConfig,
    zoom_factor: f64,
}

impl CanvasSession {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: SessionConfig) -> Self {
        Self::with_canvas(Canvas::new(), backend, config)
    }

    pub fn with_renderer(
        renderer: Box<dyn Renderer>,
        backend: Arc<dyn InferenceBackend>,
        config: SessionConfig,
    ) -> Self {
        Self::with_canvas(Canvas::with_renderer(renderer), backend, config)
    }

    fn with_canvas(canvas: Canvas, backend: Arc<dyn InferenceBackend>, config: SessionConfig) -> Self {
        let options = CoordinatorOptions {
            max_concurrent_requests: config.max_concurrent_requests,
            request_timeout: config.request_timeout,
            reader_api_key: config.reader_api_key.clone(),
        };
        let (coordinator, events) = InferenceCoordinator::new(backend, BusyCounter::new(), options);
        Self {
            canvas,
            invoker: CommandInvoker::new(),
            coordinator,
            events,
            reruns: Vec::new(),
            config,
            zoom_factor: 1.0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn invoker(&self) -> &CommandInvoker {
        &self.invoker
    }

    pub fn busy(&self) -> &BusyCounter {
        self.coordinator.busy()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn set_zoom_factor(&mut self, zoom_factor: f64) {
        self.zoom_factor = zoom_factor;
    }

    pub fn in_flight(&self) -> usize {
        self.coordinator.in_flight_count()
    }

    pub fn active_reruns(&self) -> usize {
        self.reruns.len()
    }

    // ===== Content edits (not undoable, like typing into a node) =====

    pub fn set_prompt(&mut self, node: NodeId, prompt: impl Into<String>) -> Result<()> {
        let prompt = prompt.into();
        Ok(self.canvas.update_node(node, |n| n.prompt = prompt)?)
    }

    pub fn set_model(&mut self, node: NodeId, model_id: impl Into<String>) -> Result<()> {
        let model_id = model_id.into();
        Ok(self.canvas.update_node(node, |n| n.model_id = model_id)?)
    }

    pub fn set_attached_files(&mut self, node: NodeId, paths: Vec<String>) -> Result<()> {
        Ok(self.canvas.update_node(node, |n| n.attached_file_paths = paths)?)
    }

    // ===== Undoable gestures =====

    /// New child of `parent` (inheriting its model), or a new root with the default model.
    pub fn create_node(&mut self, parent: Option<NodeId>, position: Point) -> Result<NodeId> {
        let model = match parent {
            Some(parent) => self.canvas.get(parent)?.model_id.clone(),
            None => self.config.default_model.clone(),
        };
        self.execute_create(CreateNode::new(parent, position, model))
    }

    /// Empty child placed up and to the right of `node`, at a random distance.
    pub fn fork(&mut self, node: NodeId) -> Result<NodeId> {
        let source = self.canvas.get(node)?;
        let mut rng = rand::thread_rng();
        let dx = rng.gen_range(FORK_MIN_GAP..=FORK_MIN_GAP * 3) as f64;
        let dy = rng.gen_range(FORK_MIN_GAP..=FORK_MIN_GAP * 3) as f64;
        let position = source.position + Point::new(source.size.width + dx, -dy);
        let model = source.model_id.clone();
        self.execute_create(CreateNode::new(Some(node), position, model))
    }

    /// Child asking about `selection`. Nothing is created for an empty selection.
    pub fn explain_selection(&mut self, node: NodeId, selection: &str) -> Result<Option<NodeId>> {
        if selection.is_empty() {
            return Ok(None);
        }
        let source = self.canvas.get(node)?;
        let position = source.position + EXPLAIN_OFFSET;
        let command = CreateNode::new(Some(node), position, source.model_id.clone())
            .with_prompt(format!("Explain {}", selection));
        self.execute_create(command).map(Some)
    }

    pub fn delete_subtree(&mut self, node: NodeId) -> Result<()> {
        self.invoker.execute(&mut self.canvas, DeleteSubtree::new(node))?;
        Ok(())
    }

    pub fn move_node(&mut self, node: NodeId, position: Point) -> Result<()> {
        let old = self.canvas.get(node)?.position;
        self.invoker
            .execute(&mut self.canvas, MoveNode::new(node, old, position))?;
        Ok(())
    }

    /// Returns the cloned root
    pub fn clone_branch(&mut self, node: NodeId) -> Result<NodeId> {
        let command = self.invoker.execute(&mut self.canvas, CloneBranch::new(node))?;
        Ok(command.created_node().ok_or(CanvasError::NotApplied)?)
    }

    pub fn undo(&mut self) -> Result<bool> {
        Ok(self.invoker.undo(&mut self.canvas)?)
    }

    pub fn redo(&mut self) -> Result<bool> {
        Ok(self.invoker.redo(&mut self.canvas)?)
    }

    fn execute_create(&mut self, command: CreateNode) -> Result<NodeId> {
        let command = self.invoker.execute(&mut self.canvas, command)?;
        Ok(command.created_node().ok_or(CanvasError::NotApplied)?)
    }

    // ===== Inference =====

    /// Ask the node's model for an answer to its prompt.
    pub fn submit(&mut self, node: NodeId) -> Result<()> {
        let target = self.canvas.get(node)?;
        let prompt = target.prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt(node));
        }

        let strategy = RequestStrategy::classify(prompt);
        let messages = match strategy {
            RequestStrategy::Conversation => ContextAssembler::build_context(&self.canvas, node)?,
            RequestStrategy::RemoteSummary { .. } | RequestStrategy::Search { .. } => Vec::new(),
        };
        let request = InferenceRequest {
            node,
            model_id: self.model_of(node)?,
            system_message: self.config.system_message.clone(),
            messages,
            strategy,
        };
        self.coordinator.submit(&mut self.canvas, request, Purpose::Answer)
    }

    /// Run a web search for the node's prompt and show the results as its response.
    pub fn search(&mut self, node: NodeId) -> Result<()> {
        let query = self.canvas.get(node)?.prompt.trim().to_string();
        if query.is_empty() {
            return Err(SessionError::EmptyPrompt(node));
        }
        let request = InferenceRequest {
            node,
            model_id: self.model_of(node)?,
            system_message: self.config.system_message.clone(),
            messages: Vec::new(),
            strategy: RequestStrategy::Search { query },
        };
        self.coordinator.submit(&mut self.canvas, request, Purpose::Answer)
    }

    /// Ask for three follow-up questions; each one becomes a child of `node` when the answer
    /// arrives.
    pub fn generate_follow_ups(&mut self, node: NodeId) -> Result<()> {
        let request = InferenceRequest {
            node,
            model_id: self.model_of(node)?,
            system_message: self.config.system_message.clone(),
            messages: ContextAssembler::build_follow_up_context(&self.canvas, node)?,
            strategy: RequestStrategy::Conversation,
        };
        self.coordinator.submit(&mut self.canvas, request, Purpose::FollowUps)
    }

    /// Re-submit every node from the root down to `leaf`, one after another.
    pub fn rerun(&mut self, leaf: NodeId) -> Result<()> {
        let path = self.canvas.path_from_root(leaf)?;
        log::info!("Re-running {} node(s) ending at {}", path.len(), leaf);

        let mut scheduler = RerunScheduler::new();
        let first = scheduler.start(path);
        self.drive_rerun(&mut scheduler, first);
        if !scheduler.is_done() {
            self.reruns.push(scheduler);
        }
        Ok(())
    }

    /// Wait for the next result and apply it. Returns `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Delivery> {
        if self.coordinator.in_flight_count() == 0 {
            return None;
        }
        let event = self.events.recv().await?;
        let delivery = self.coordinator.deliver(&mut self.canvas, event);

        if let (Purpose::FollowUps, Ok(text)) = (delivery.purpose, &delivery.outcome) {
            self.add_follow_ups(delivery.node, text);
        }
        self.advance_reruns(delivery.node);
        Some(delivery)
    }

    /// Apply results until no request is left, re-run steps included.
    pub async fn run_until_idle(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        while let Some(delivery) = self.next_event().await {
            deliveries.push(delivery);
        }
        deliveries
    }

    fn model_of(&self, node: NodeId) -> Result<String> {
        let model = &self.canvas.get(node)?.model_id;
        if model.is_empty() {
            Ok(self.config.default_model.clone())
        } else {
            Ok(model.clone())
        }
    }

    /// Submit `next`, skipping steps that have nothing to send. A step whose node already has
    /// a request in flight stays queued and is submitted once that request delivers, with
    /// context assembled at that point.
    fn drive_rerun(&mut self, scheduler: &mut RerunScheduler, mut next: Option<NodeId>) {
        while let Some(node) = next {
            if self.coordinator.is_in_flight(node) {
                log::debug!("Re-run step queued behind in-flight node {}", node);
                return;
            }
            match self.submit(node) {
                Ok(()) => {
                    scheduler.mark_submitted();
                    return;
                }
                Err(e) => {
                    log::info!("Re-run skipping node {}: {}", node, e);
                    next = scheduler.advance();
                }
            }
        }
    }

    fn advance_reruns(&mut self, node: NodeId) {
        if self.reruns.is_empty() {
            return;
        }
        let mut reruns = std::mem::take(&mut self.reruns);
        for scheduler in &mut reruns {
            let next = scheduler.on_child_notify(node);
            if next.is_some() {
                self.drive_rerun(scheduler, next);
            }
        }
        reruns.retain(|scheduler| !scheduler.is_done());
        self.reruns = reruns;
    }

    fn add_follow_ups(&mut self, node: NodeId, text: &str) {
        let Some(source) = self.canvas.node(node) else {
            return;
        };
        let origin = source.position;
        let size = source.size;
        let model = source.model_id.clone();

        let mut created = 0;
        for (i, line) in text.split('\n').enumerate() {
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            let offset = Point::new(size.width + 200.0, i as f64 * (size.height + 50.0));
            let command = CreateNode::new(Some(node), origin + offset, model.clone()).with_prompt(question);
            if let Err(e) = self.invoker.execute(&mut self.canvas, command) {
                log::warn!("Could not add follow-up questions to node {}: {}", node, e);
                break;
            }
            created += 1;
        }
        log::info!("Added {} follow-up question(s) under node {}", created, node);
    }

    // ===== Persistence =====

    pub fn save(&self, path: &Path) -> Result<()> {
        let document = CanvasDocument::from_canvas(&self.canvas, self.zoom_factor);
        save_document(path, &document)?;
        Ok(())
    }

    /// Replace the canvas with the document at `path`. Undo history is discarded.
    pub fn load(&mut self, path: &Path) -> Result<Vec<NodeId>> {
        let document = load_document(path)?;
        let roots = document.restore_into(&mut self.canvas);
        self.invoker.clear();
        self.reruns.clear();
        self.zoom_factor = document.zoom_factor;
        Ok(roots)
    }
}
