//! Inference coordinator
//!
//! Requests run on tokio tasks bounded by a semaphore. Tasks never touch the canvas: each
//! one sends a single [`InferenceEvent`] back over a channel and the owner of the canvas
//! applies it with [`InferenceCoordinator::deliver`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use canvas_core::{Canvas, CanvasError, ChatMessage, NodeId};
use canvas_llm::{InferenceBackend, LLMError};
use tokio::sync::{mpsc, Semaphore};

use crate::busy::BusyCounter;
use crate::classify::RequestStrategy;
use crate::error::{Result, SessionError};

/// What the completion text is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Becomes the node's response
    Answer,
    /// One follow-up question per line, turned into child nodes by the session
    FollowUps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub node: NodeId,
    pub model_id: String,
    pub system_message: String,
    pub messages: Vec<ChatMessage>,
    pub strategy: RequestStrategy,
}

/// Result of one request, sent exactly once per submission
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceEvent {
    pub node: NodeId,
    pub purpose: Purpose,
    pub outcome: std::result::Result<String, String>,
}

/// An applied [`InferenceEvent`]. Doubles as the child-notify signal, whatever the outcome.
pub type Delivery = InferenceEvent;

#[derive(Debug, Clone, Default)]
pub struct CoordinatorOptions {
    pub max_concurrent_requests: usize,
    pub request_timeout: Option<Duration>,
    pub reader_api_key: Option<String>,
}

pub struct InferenceCoordinator {
    backend: Arc<dyn InferenceBackend>,
    busy: BusyCounter,
    permits: Arc<Semaphore>,
    request_timeout: Option<Duration>,
    reader_api_key: Option<String>,
    events: mpsc::UnboundedSender<InferenceEvent>,
    in_flight: HashSet<NodeId>,
}

impl InferenceCoordinator {
    /// Returns the coordinator and the receiving end its tasks report to
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        busy: BusyCounter,
        options: CoordinatorOptions,
    ) -> (Self, mpsc::UnboundedReceiver<InferenceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            backend,
            busy,
            permits: Arc::new(Semaphore::new(options.max_concurrent_requests.max(1))),
            request_timeout: options.request_timeout,
            reader_api_key: options.reader_api_key,
            events,
            in_flight: HashSet::new(),
        };
        (coordinator, rx)
    }

    pub fn busy(&self) -> &BusyCounter {
        &self.busy
    }

    pub fn is_in_flight(&self, node: NodeId) -> bool {
        self.in_flight.contains(&node)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Start a request for `request.node`. Must be called from within a tokio runtime.
    ///
    /// Fails with [`SessionError::AlreadyProcessing`] while an earlier request for the same
    /// node is unanswered.
    pub fn submit(&mut self, canvas: &mut Canvas, request: InferenceRequest, purpose: Purpose) -> Result<()> {
        let node = request.node;
        if !canvas.contains(node) {
            return Err(CanvasError::NodeNotFound(node).into());
        }
        if self.in_flight.contains(&node) {
            return Err(SessionError::AlreadyProcessing(node));
        }

        canvas.set_processing(node, true)?;
        self.in_flight.insert(node);
        let active = self.busy.increment();
        log::info!(
            "Submitting node {} to '{}' ({:?}, {} message(s), {} active)",
            node,
            request.model_id,
            purpose,
            request.messages.len(),
            active
        );

        let backend = Arc::clone(&self.backend);
        let permits = Arc::clone(&self.permits);
        let events = self.events.clone();
        let timeout = self.request_timeout;
        let reader_api_key = self.reader_api_key.clone();

        tokio::spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(_permit) => {
                    let work = run_request(backend.as_ref(), &request, reader_api_key.as_deref());
                    let result = match timeout {
                        Some(limit) => match tokio::time::timeout(limit, work).await {
                            Ok(result) => result,
                            Err(_) => Err(LLMError::Timeout(limit)),
                        },
                        None => work.await,
                    };
                    result.map_err(|e| e.to_string())
                }
                Err(e) => Err(format!("Worker pool closed: {}", e)),
            };

            let event = InferenceEvent {
                node: request.node,
                purpose,
                outcome,
            };
            if events.send(event).is_err() {
                log::warn!("Dropped result for node {}: session is gone", request.node);
            }
        });
        Ok(())
    }

    /// Apply a finished request on the owner's side.
    ///
    /// Clears the processing flag and, for answers, writes the text (or the error) into the
    /// node's response. Nodes that have since left the arena are skipped.
    pub fn deliver(&mut self, canvas: &mut Canvas, event: InferenceEvent) -> Delivery {
        if self.in_flight.remove(&event.node) {
            self.busy.decrement();
        }

        match &event.outcome {
            Ok(text) => log::info!("Node {} completed ({} chars)", event.node, text.len()),
            Err(e) => log::warn!("Node {} failed: {}", event.node, e),
        }

        if canvas.contains(event.node) {
            let _ = canvas.set_processing(event.node, false);
            let response = match (&event.outcome, event.purpose) {
                (Ok(text), Purpose::Answer) => Some(text.clone()),
                (Ok(_), Purpose::FollowUps) => None,
                (Err(e), _) => Some(format!("Error occurred: {}", e)),
            };
            if let Some(response) = response {
                let _ = canvas.update_node(event.node, |node| node.response_markdown = response);
            }
        } else {
            log::debug!("Node {} no longer exists; result discarded", event.node);
        }
        event
    }
}

async fn run_request(
    backend: &dyn InferenceBackend,
    request: &InferenceRequest,
    reader_api_key: Option<&str>,
) -> canvas_llm::Result<String> {
    match &request.strategy {
        RequestStrategy::Conversation => {
            backend
                .complete(&request.model_id, &request.system_message, &request.messages)
                .await
        }
        RequestStrategy::RemoteSummary { url } => {
            let content = backend.fetch_remote_content(url, reader_api_key).await?;
            backend
                .complete(
                    &request.model_id,
                    &request.system_message,
                    &[ChatMessage::user(content)],
                )
                .await
        }
        RequestStrategy::Search { query } => backend.search(query).await,
    }
}
