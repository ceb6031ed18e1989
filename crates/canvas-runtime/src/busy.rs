use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of inference requests in flight, for UI feedback only.
///
/// Clones share the same count. One counter is created per session and handed to its
/// coordinator.
#[derive(Debug, Clone, Default)]
pub struct BusyCounter {
    active: Arc<AtomicUsize>,
}

impl BusyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new count
    pub fn increment(&self) -> usize {
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the new count. Never goes below zero.
    pub fn decrement(&self) -> usize {
        let previous = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn get(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.get() == 0
    }
}
